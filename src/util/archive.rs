//! Archive compression and extraction.
//!
//! Supports zip (the default), plain tar, and gzip-compressed tar. Extraction
//! never writes outside the destination directory: zip entries without an
//! enclosed name are skipped and tar entries are unpacked with `unpack_in`.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::ops::errors::PackError;
use crate::util::fs::{list_files, to_slash};

/// Compresses a directory into a single archive file and back.
pub trait ArchiveCodec {
    /// Format name, as accepted by `--format`.
    fn name(&self) -> &str;

    /// File extension including the leading dot.
    fn extension(&self) -> &str;

    /// Write every regular file under `src` into a new archive at `dest`.
    fn compress_dir(&self, src: &Path, dest: &Path) -> Result<()>;

    /// Extract `archive` into the existing directory `dest`.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Built-in archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    #[default]
    Zip,
    Tar,
    GzTar,
}

impl ArchiveFormat {
    /// Guess the format of an existing archive from its name, falling back to
    /// its leading bytes.
    pub fn detect(path: &Path) -> Option<ArchiveFormat> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".zip") {
            return Some(ArchiveFormat::Zip);
        }
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            return Some(ArchiveFormat::GzTar);
        }
        if name.ends_with(".tar") {
            return Some(ArchiveFormat::Tar);
        }

        let mut header = Vec::with_capacity(512);
        File::open(path)
            .ok()?
            .take(512)
            .read_to_end(&mut header)
            .ok()?;
        if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
            Some(ArchiveFormat::Zip)
        } else if header.starts_with(&[0x1f, 0x8b]) {
            Some(ArchiveFormat::GzTar)
        } else if header.get(257..262) == Some(b"ustar".as_slice()) {
            Some(ArchiveFormat::Tar)
        } else {
            None
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar" => Ok(ArchiveFormat::Tar),
            "gztar" | "tar.gz" | "tgz" => Ok(ArchiveFormat::GzTar),
            _ => Err(PackError::UnknownFormat {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ArchiveCodec for ArchiveFormat {
    fn name(&self) -> &str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::GzTar => "gztar",
        }
    }

    fn extension(&self) -> &str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::Tar => ".tar",
            ArchiveFormat::GzTar => ".tar.gz",
        }
    }

    fn compress_dir(&self, src: &Path, dest: &Path) -> Result<()> {
        let file = File::create(dest)
            .with_context(|| format!("failed to create archive: {}", dest.display()))?;
        let written = match self {
            ArchiveFormat::Zip => write_zip(src, file),
            ArchiveFormat::Tar => write_tar(src, file).map(drop),
            ArchiveFormat::GzTar => write_tar(src, GzEncoder::new(file, Compression::default()))
                .and_then(|encoder| {
                    encoder.finish().context("failed to finish gzip stream")?;
                    Ok(())
                }),
        };
        written.with_context(|| format!("failed to write archive: {}", dest.display()))
    }

    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        let file = File::open(archive)
            .with_context(|| format!("failed to open archive: {}", archive.display()))?;
        match self {
            ArchiveFormat::Zip => extract_zip(file, dest),
            ArchiveFormat::Tar => extract_tar(file, dest),
            ArchiveFormat::GzTar => extract_tar(GzDecoder::new(file), dest),
        }
    }
}

fn write_zip(src: &Path, file: File) -> Result<()> {
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);

    for relative in list_files(src)? {
        let name = to_slash(&relative);
        zip.start_file(name.clone(), options)
            .with_context(|| format!("failed to add {} to archive", name))?;
        let mut input = File::open(src.join(&relative))
            .with_context(|| format!("failed to open {}", src.join(&relative).display()))?;
        io::copy(&mut input, &mut zip)
            .with_context(|| format!("failed to compress {}", name))?;
    }

    zip.finish().context("failed to finish zip archive")?;
    Ok(())
}

fn write_tar<W: io::Write>(src: &Path, out: W) -> Result<W> {
    let mut builder = tar::Builder::new(out);
    for relative in list_files(src)? {
        builder
            .append_path_with_name(src.join(&relative), to_slash(&relative))
            .with_context(|| format!("failed to add {} to archive", relative.display()))?;
    }
    builder.into_inner().context("failed to finish tar archive")
}

fn extract_zip(file: File, dest: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(file).context("not a valid zip archive")?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("failed to read zip entry {}", i))?;
        let Some(enclosed) = entry.enclosed_name() else {
            tracing::debug!("Skipping unsafe zip entry: {}", entry.name());
            continue;
        };
        let out_path = dest.join(enclosed);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("failed to create {}", out_path.display()))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut outfile = File::create(&out_path)
            .with_context(|| format!("failed to create {}", out_path.display()))?;
        io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
    }

    Ok(())
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries().context("failed to read tar entries")? {
        let mut entry = entry.context("failed to read tar entry")?;
        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory
            | tar::EntryType::Regular
            | tar::EntryType::Continuous
            | tar::EntryType::Symlink
            | tar::EntryType::Link => {
                let entry_path = entry
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                let unpacked = entry
                    .unpack_in(dest)
                    .with_context(|| format!("failed to extract {}", entry_path))?;
                if !unpacked {
                    tracing::debug!("Skipping unsafe tar entry: {}", entry_path);
                }
            }
            _ => {
                tracing::debug!("Skipping unsupported tar entry type {:?}", entry_type);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn populate(dir: &Path) {
        fs::create_dir_all(dir.join("lib")).unwrap();
        fs::write(dir.join("main.wdl"), "version 1.0\n").unwrap();
        fs::write(dir.join("lib/tasks.wdl"), "task t {}\n").unwrap();
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert_eq!("TAR".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Tar);
        assert_eq!("tgz".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::GzTar);
        assert_eq!(
            "tar.gz".parse::<ArchiveFormat>().unwrap(),
            ArchiveFormat::GzTar
        );
        assert!(matches!(
            "rar".parse::<ArchiveFormat>(),
            Err(PackError::UnknownFormat { .. })
        ));
        assert_eq!(ArchiveFormat::default().to_string(), "zip");
    }

    #[test]
    fn test_every_format_extracts_what_it_compressed() {
        for format in [ArchiveFormat::Zip, ArchiveFormat::Tar, ArchiveFormat::GzTar] {
            let tmp = TempDir::new().unwrap();
            let src = tmp.path().join("src");
            populate(&src);

            let archive = tmp.path().join(format!("out{}", format.extension()));
            format.compress_dir(&src, &archive).unwrap();
            assert_eq!(ArchiveFormat::detect(&archive), Some(format));

            let dest = tmp.path().join("dest");
            fs::create_dir_all(&dest).unwrap();
            format.extract(&archive, &dest).unwrap();

            assert_eq!(
                fs::read_to_string(dest.join("lib/tasks.wdl")).unwrap(),
                "task t {}\n",
                "format {}",
                format
            );
        }
    }

    #[test]
    fn test_detect_by_magic_bytes() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        populate(&src);

        let archive = tmp.path().join("packaged.bin");
        ArchiveFormat::Zip.compress_dir(&src, &archive).unwrap();
        assert_eq!(ArchiveFormat::detect(&archive), Some(ArchiveFormat::Zip));

        let junk = tmp.path().join("notes.txt");
        fs::write(&junk, "plain text").unwrap();
        assert_eq!(ArchiveFormat::detect(&junk), None);
    }

    #[test]
    fn test_zip_traversal_entries_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("evil.zip");
        {
            let mut zip = ZipWriter::new(File::create(&archive).unwrap());
            let options = FileOptions::<()>::default();
            zip.start_file("../escape.txt", options).unwrap();
            zip.write_all(b"gotcha").unwrap();
            zip.start_file("ok.txt", options).unwrap();
            zip.write_all(b"fine").unwrap();
            zip.finish().unwrap();
        }

        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        ArchiveFormat::Zip.extract(&archive, &dest).unwrap();

        assert!(dest.join("ok.txt").exists());
        assert!(!tmp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_corrupt_zip_fails() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("broken.zip");
        fs::write(&archive, "PK\x03\x04 this is not really a zip").unwrap();

        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        assert!(ArchiveFormat::Zip.extract(&archive, &dest).is_err());
    }
}
