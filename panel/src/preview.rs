use std::collections::HashMap;

use log::debug;

/// Icon shown on a preview control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewIcon {
    Play,
    Pause,
}

/// What should happen to the embedded content frame of a preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameChange {
    Insert { url: String },
    Remove,
}

#[derive(Debug)]
struct PreviewItem {
    url: String,
    playing: bool,
}

/// Per-item play/stop toggles for the playlist previews. Purely local
/// state; no network I/O.
#[derive(Debug, Default)]
pub struct PreviewPlayer {
    items: HashMap<String, PreviewItem>,
}

impl PreviewPlayer {
    pub fn register(&mut self, id: impl Into<String>, url: impl Into<String>) {
        self.items.insert(
            id.into(),
            PreviewItem {
                url: url.into(),
                playing: false,
            },
        );
    }

    pub fn icon(&self, id: &str) -> Option<PreviewIcon> {
        self.items.get(id).map(|item| {
            if item.playing {
                PreviewIcon::Pause
            } else {
                PreviewIcon::Play
            }
        })
    }

    /// Flip the preview between playing and stopped. Returns the new icon
    /// and the frame change to apply, or `None` for an unknown id.
    pub fn toggle(&mut self, id: &str) -> Option<(PreviewIcon, FrameChange)> {
        let item = self.items.get_mut(id)?;
        item.playing = !item.playing;

        debug!("Preview `{id}` now {}", if item.playing { "playing" } else { "stopped" });

        Some(if item.playing {
            (
                PreviewIcon::Pause,
                FrameChange::Insert {
                    url: item.url.clone(),
                },
            )
        } else {
            (PreviewIcon::Play, FrameChange::Remove)
        })
    }
}
