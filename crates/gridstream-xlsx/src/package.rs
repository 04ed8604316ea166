//! Package sources
//!
//! An XLSX file is a zip archive of XML parts. Everything else in this crate
//! reaches parts by their logical name through [`PackageSource`], so a
//! document can be read from a zip file or from parts held in memory.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, Write};
use std::path::Path;

use crate::error::{XlsxError, XlsxResult};

/// Reader over the bytes of one part
pub type PartReader<'a> = Box<dyn BufRead + 'a>;

/// A set of named parts
pub trait PackageSource {
    /// Names of all parts, in archive order
    fn part_names(&self) -> Vec<String>;

    /// Check whether a part exists
    fn has_part(&self, name: &str) -> bool;

    /// Open a part for streaming
    fn open_part(&mut self, name: &str) -> XlsxResult<PartReader<'_>>;

    /// Read a whole part into memory
    fn read_part(&mut self, name: &str) -> XlsxResult<Vec<u8>> {
        let mut reader = self.open_part(name)?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Parts held in memory, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryPackage {
    parts: BTreeMap<String, Vec<u8>>,
}

impl MemoryPackage {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every part of a zip archive
    pub fn from_zip<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            parts.insert(file.name().to_string(), bytes);
        }
        Ok(Self { parts })
    }

    /// Add or replace a part
    pub fn insert<N: Into<String>, B: Into<Vec<u8>>>(&mut self, name: N, bytes: B) {
        self.parts.insert(name.into(), bytes.into());
    }

    /// Builder form of [`MemoryPackage::insert`]
    pub fn with_part<N: Into<String>, B: Into<Vec<u8>>>(mut self, name: N, bytes: B) -> Self {
        self.insert(name, bytes);
        self
    }

    /// Bytes of a part
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Remove a part
    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if the package has no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterate over `(name, bytes)` in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.parts.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Serialize as a zip archive
    pub fn write_zip<W: Write + Seek>(&self, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default();

        // [Content_Types].xml goes first, as Office writes it
        let ordered = self
            .parts
            .iter()
            .filter(|(name, _)| name.as_str() == CONTENT_TYPES)
            .chain(self.parts.iter().filter(|(name, _)| name.as_str() != CONTENT_TYPES));
        for (name, bytes) in ordered {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Serialize as a zip file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        self.write_zip(file)
    }
}

impl PackageSource for MemoryPackage {
    fn part_names(&self) -> Vec<String> {
        self.parts.keys().cloned().collect()
    }

    fn has_part(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    fn open_part(&mut self, name: &str) -> XlsxResult<PartReader<'_>> {
        let bytes = self
            .parts
            .get(name)
            .ok_or_else(|| XlsxError::MissingPart(name.to_string()))?;
        Ok(Box::new(bytes.as_slice()))
    }
}

/// Parts read lazily from a zip archive
pub struct ZipPackage<R> {
    archive: zip::ZipArchive<R>,
}

impl ZipPackage<BufReader<File>> {
    /// Open a zip file
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ZipPackage<R> {
    /// Wrap a zip archive reader
    pub fn new(reader: R) -> XlsxResult<Self> {
        let archive = zip::ZipArchive::new(reader)?;
        Ok(Self { archive })
    }
}

impl<R: Read + Seek> PackageSource for ZipPackage<R> {
    fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(String::from).collect()
    }

    fn has_part(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    fn open_part(&mut self, name: &str) -> XlsxResult<PartReader<'_>> {
        match self.archive.by_name(name) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(zip::result::ZipError::FileNotFound) => {
                Err(XlsxError::MissingPart(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Name of the content types part
pub const CONTENT_TYPES: &str = "[Content_Types].xml";
