use crate::codec::{CodecError, TextFormat};
use crate::document::DocumentTree;
use crate::models::NoteFile;
use crate::registry::ConverterRegistry;
use relative_path::{Component, RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(String),
    #[error("Unrecognized note format: {0}")]
    UnknownFormat(PathBuf),
    #[error("Invalid note name: {0:?}")]
    InvalidNoteName(String),
    #[error("Note already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Read a note file's stored text
pub fn read_file(relative_path: &RelativePath, notes_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(notes_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write stored text to a note file
pub fn write_file(
    relative_path: &RelativePath,
    notes_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(notes_root);

    // Create parent directories if they don't exist
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// Read and parse a note, picking the codec from its file extension
pub fn read_note(
    note: &NoteFile,
    notes_root: &Path,
    registry: &ConverterRegistry,
) -> Result<DocumentTree, IoError> {
    let content = read_file(note.relative_path(), notes_root)?;
    let tree = registry.parse(&content, note.format())?;
    log::debug!("Loaded {} ({})", note.relative_path(), note.format());
    Ok(tree)
}

/// Save a tree to a note in the note's own format
pub fn write_note(
    note: &NoteFile,
    notes_root: &Path,
    tree: &DocumentTree,
    registry: &ConverterRegistry,
) -> Result<(), IoError> {
    let content = registry.save(tree, note.format())?;
    write_file(note.relative_path(), notes_root, &content)?;
    log::debug!("Saved {} ({})", note.relative_path(), note.format());
    Ok(())
}

/// Create an empty note called `name` stored as `format`.
///
/// The format's extension is appended unless `name` already ends with it.
/// Names that are blank or climb out of the notes directory are rejected,
/// and an existing file is never overwritten.
pub fn create_note(
    notes_root: &Path,
    name: &str,
    format: TextFormat,
    registry: &ConverterRegistry,
) -> Result<NoteFile, IoError> {
    let name = name.trim();
    let relative = if TextFormat::from_path(Path::new(name)) == Some(format) {
        RelativePathBuf::from(name)
    } else {
        RelativePathBuf::from(format!("{name}.{}", format.extension()))
    };
    let escapes_root = relative
        .components()
        .any(|component| matches!(component, Component::ParentDir));
    if name.is_empty() || escapes_root {
        return Err(IoError::InvalidNoteName(name.to_string()));
    }

    let absolute_path = relative.to_path(notes_root);
    if absolute_path.exists() {
        return Err(IoError::AlreadyExists(absolute_path));
    }

    let note = NoteFile::new(relative, format);
    write_note(&note, notes_root, &DocumentTree::empty(), registry)?;
    log::info!("Created {}", note.relative_path());
    Ok(note)
}

/// Scan for note files (any extension a [`TextFormat`] claims) in the notes directory
pub fn scan_note_files(notes_root: &Path) -> Result<Vec<NoteFile>, IoError> {
    if !notes_root.exists() {
        return Err(IoError::InvalidNotesDir(
            "notes directory not found".to_string(),
        ));
    }

    let mut files = Vec::new();
    scan_directory_recursive(notes_root, &mut files)?;
    files.sort();

    files
        .iter()
        .map(|path| note_file_for(path, notes_root))
        .collect()
}

fn note_file_for(path: &Path, notes_root: &Path) -> Result<NoteFile, IoError> {
    let relative = path
        .strip_prefix(notes_root)
        .ok()
        .and_then(|p| RelativePathBuf::from_path(p).ok())
        .ok_or_else(|| {
            IoError::InvalidNotesDir(format!("{} is outside the notes directory", path.display()))
        })?;
    NoteFile::detect(relative).ok_or_else(|| IoError::UnknownFormat(path.to_path_buf()))
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if TextFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_notes_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidNotesDir(
            "Directory does not exist".to_string(),
        ));
    }

    Ok(())
}
