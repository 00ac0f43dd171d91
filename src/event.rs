use crate::platform::FileStoreEntry;

/// What the mirror does with one file-store entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MirrorEvent {
    Fetch(FileStoreEntry),
    SkipFolder(FileStoreEntry),
}

impl MirrorEvent {
    pub fn entry(&self) -> &FileStoreEntry {
        match self {
            MirrorEvent::Fetch(entry) | MirrorEvent::SkipFolder(entry) => entry,
        }
    }
}
