//! Background model loading

use crate::progress::LoadProgress;
use showroom_core::{Error, Result, TriangleMesh};
use std::fmt;
use std::path::PathBuf;
use std::thread;

/// Where a model comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// File on the local disk
    Path(PathBuf),
    /// Remote `http(s)` location, only usable by external AR viewers
    Url(String),
}

impl AssetSource {
    /// Classify a user-supplied model location
    pub fn parse(input: &str) -> Self {
        let lower = input.trim().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            AssetSource::Url(input.trim().to_string())
        } else {
            AssetSource::Path(PathBuf::from(input))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, AssetSource::Url(_))
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Path(path) => write!(f, "{}", path.display()),
            AssetSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Message from the loading thread
#[derive(Debug)]
pub enum LoadEvent {
    Progress(LoadProgress),
    Finished(Result<TriangleMesh>),
}

/// Loads a model on its own thread.
///
/// Progress is reported at most once per whole percent. Exactly one
/// [`LoadEvent::Finished`] is sent, as the last event.
pub struct AssetLoader {
    source: AssetSource,
    receiver: flume::Receiver<LoadEvent>,
    progress: LoadProgress,
    finished: bool,
}

impl AssetLoader {
    pub fn spawn(source: AssetSource) -> Self {
        let (sender, receiver) = flume::unbounded();

        let job_source = source.clone();
        let spawned = thread::Builder::new()
            .name("showroom-loader".to_string())
            .spawn(move || run_load(job_source, sender));

        // On failure the sender is dropped with the closure and the first
        // poll reports the disconnected channel as an error.
        if let Err(e) = spawned {
            log::error!("Failed to start loader thread: {}", e);
        }

        Self::with_receiver(source, receiver)
    }

    fn with_receiver(source: AssetSource, receiver: flume::Receiver<LoadEvent>) -> Self {
        Self {
            source,
            receiver,
            progress: LoadProgress::new(0, 0),
            finished: false,
        }
    }

    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    /// Latest progress seen by [`AssetLoader::poll`]
    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain pending events without blocking.
    ///
    /// Returns the load result once it arrives; later calls return `None`.
    pub fn poll(&mut self) -> Option<Result<TriangleMesh>> {
        if self.finished {
            return None;
        }

        for event in self.receiver.try_iter() {
            match event {
                LoadEvent::Progress(progress) => self.progress = progress,
                LoadEvent::Finished(result) => {
                    self.finished = true;
                    return Some(result);
                }
            }
        }

        if self.receiver.is_disconnected() && self.receiver.is_empty() {
            self.finished = true;
            return Some(Err(Error::Asset(format!(
                "loader for {} stopped without a result",
                self.source
            ))));
        }

        None
    }

    /// Block until the load finishes
    pub fn wait(mut self) -> Result<TriangleMesh> {
        if self.finished {
            return Err(Error::Asset("load result was already taken".to_string()));
        }

        loop {
            match self.receiver.recv() {
                Ok(LoadEvent::Progress(progress)) => self.progress = progress,
                Ok(LoadEvent::Finished(result)) => return result,
                Err(_) => {
                    return Err(Error::Asset(format!(
                        "loader for {} stopped without a result",
                        self.source
                    )))
                }
            }
        }
    }
}

fn run_load(source: AssetSource, sender: flume::Sender<LoadEvent>) {
    log::info!("Loading model from {}", source);

    let result = match &source {
        AssetSource::Url(url) => Err(Error::Unsupported(format!(
            "remote models cannot be loaded into the viewer: {}",
            url
        ))),
        AssetSource::Path(path) => {
            let mut last_percent = None;
            crate::read_mesh_with_progress(path, |progress| {
                let percent = progress.percent().floor() as u32;
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    let _ = sender.send(LoadEvent::Progress(progress));
                }
            })
        }
    };

    match &result {
        Ok(mesh) => log::info!(
            "Loaded {} ({} vertices, {} faces)",
            source,
            mesh.vertex_count(),
            mesh.face_count()
        ),
        Err(e) => log::warn!("Failed to load {}: {}", source, e),
    }

    // The viewer may have been closed already
    let _ = sender.send(LoadEvent::Finished(result));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            AssetSource::parse("https://example.com/machine.glb"),
            AssetSource::Url("https://example.com/machine.glb".to_string())
        );
        assert!(AssetSource::parse("HTTP://example.com/a.obj").is_remote());
        assert_eq!(
            AssetSource::parse("models/machine.obj"),
            AssetSource::Path(PathBuf::from("models/machine.obj"))
        );
    }

    #[test]
    fn test_url_is_rejected() {
        let loader = AssetLoader::spawn(AssetSource::parse("https://example.com/machine.glb"));
        assert!(matches!(loader.wait(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_background_load_finishes_at_full_progress() {
        let path = std::env::temp_dir().join("showroom_io_loader.obj");
        fs::write(&path, "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();

        let mut loader = AssetLoader::spawn(AssetSource::Path(path.clone()));
        let mesh = loop {
            if let Some(result) = loader.poll() {
                break result.unwrap();
            }
            thread::yield_now();
        };

        assert_eq!(mesh.face_count(), 2);
        assert!(loader.is_finished());
        assert!(loader.poll().is_none());
        // Progress sent before Finished is drained in the same poll
        assert_eq!(loader.progress().percent(), 100.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_reports_error() {
        let loader = AssetLoader::spawn(AssetSource::Path(PathBuf::from("nope/missing.obj")));
        assert!(matches!(loader.wait(), Err(Error::Io(_))));
    }
}
