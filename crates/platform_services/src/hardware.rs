//! Hardware collaborator contract: audio capture, file picker, geolocation,
//! notifications, and downloads.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use app_schema::FileSelectOptions;

use crate::error::HardwareError;

/// Object-safe boxed future used by [`HardwareService`] methods.
pub type HardwareFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A completed audio recording handed back by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRecording {
    /// Recorded bytes.
    pub bytes: Vec<u8>,
    /// Filename chosen by the host for the recording.
    pub filename: String,
    /// Recorded duration in milliseconds.
    pub duration_ms: u64,
}

/// A file returned by the host file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Original filename.
    pub name: String,
    /// MIME type reported by the host.
    pub mime_type: String,
    /// File payload.
    pub bytes: Vec<u8>,
}

/// A geolocation fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy_m: f64,
}

/// Host hardware capabilities, all best-effort.
///
/// Permission denial is a legitimate negative result (`Ok(false)` /
/// `Ok(None)` / empty list), never an error.
pub trait HardwareService {
    /// Starts an audio recording; `Ok(false)` means the microphone was denied.
    fn start_audio_recording<'a>(&'a self) -> HardwareFuture<'a, Result<bool, HardwareError>>;

    /// Stops the active recording; `Ok(None)` means nothing was recorded.
    fn stop_audio_recording<'a>(
        &'a self,
        filename: Option<&'a str>,
    ) -> HardwareFuture<'a, Result<Option<AudioRecording>, HardwareError>>;

    /// Opens the host file picker; an empty list means cancelled or denied.
    fn select_files<'a>(
        &'a self,
        options: &'a FileSelectOptions,
    ) -> HardwareFuture<'a, Result<Vec<SelectedFile>, HardwareError>>;

    /// Returns the current location; `Ok(None)` means denied or unavailable.
    fn current_location<'a>(
        &'a self,
    ) -> HardwareFuture<'a, Result<Option<GeoLocation>, HardwareError>>;

    /// Shows a notification; `Ok(false)` means notifications were denied.
    fn show_notification<'a>(
        &'a self,
        title: &'a str,
        body: &'a str,
    ) -> HardwareFuture<'a, Result<bool, HardwareError>>;

    /// Fetches the bytes behind a URL on behalf of the runtime.
    fn fetch_url<'a>(&'a self, url: &'a str) -> HardwareFuture<'a, Result<Vec<u8>, HardwareError>>;

    /// Hands bytes to the host download routine.
    fn download_file<'a>(
        &'a self,
        bytes: Vec<u8>,
        filename: &'a str,
    ) -> HardwareFuture<'a, Result<(), HardwareError>>;

    /// Opens a URL outside the shell.
    fn open_external_url<'a>(
        &'a self,
        url: &'a str,
    ) -> HardwareFuture<'a, Result<(), HardwareError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Hardware service that denies every capability, for headless targets.
pub struct NoopHardwareService;

impl HardwareService for NoopHardwareService {
    fn start_audio_recording<'a>(&'a self) -> HardwareFuture<'a, Result<bool, HardwareError>> {
        Box::pin(async { Ok(false) })
    }

    fn stop_audio_recording<'a>(
        &'a self,
        _filename: Option<&'a str>,
    ) -> HardwareFuture<'a, Result<Option<AudioRecording>, HardwareError>> {
        Box::pin(async { Ok(None) })
    }

    fn select_files<'a>(
        &'a self,
        _options: &'a FileSelectOptions,
    ) -> HardwareFuture<'a, Result<Vec<SelectedFile>, HardwareError>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn current_location<'a>(
        &'a self,
    ) -> HardwareFuture<'a, Result<Option<GeoLocation>, HardwareError>> {
        Box::pin(async { Ok(None) })
    }

    fn show_notification<'a>(
        &'a self,
        _title: &'a str,
        _body: &'a str,
    ) -> HardwareFuture<'a, Result<bool, HardwareError>> {
        Box::pin(async { Ok(false) })
    }

    fn fetch_url<'a>(&'a self, url: &'a str) -> HardwareFuture<'a, Result<Vec<u8>, HardwareError>> {
        Box::pin(async move { Err(HardwareError::Unavailable(format!("no fetch for {url}"))) })
    }

    fn download_file<'a>(
        &'a self,
        _bytes: Vec<u8>,
        _filename: &'a str,
    ) -> HardwareFuture<'a, Result<(), HardwareError>> {
        Box::pin(async { Ok(()) })
    }

    fn open_external_url<'a>(
        &'a self,
        _url: &'a str,
    ) -> HardwareFuture<'a, Result<(), HardwareError>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Default)]
struct MemoryHardwareState {
    recording_active: bool,
    next_recording: Option<AudioRecording>,
    pickable_files: Vec<SelectedFile>,
    location: Option<GeoLocation>,
    url_bodies: Vec<(String, Vec<u8>)>,
    notifications: Vec<(String, String)>,
    downloads: Vec<(String, Vec<u8>)>,
    opened_urls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
/// Scriptable in-memory hardware service for tests and the simulator host.
pub struct MemoryHardwareService {
    inner: Rc<RefCell<MemoryHardwareState>>,
}

impl MemoryHardwareService {
    /// Scripts the recording returned by the next `stop_audio_recording`.
    pub fn set_next_recording(&self, recording: AudioRecording) {
        self.inner.borrow_mut().next_recording = Some(recording);
    }

    /// Scripts the files returned by the next `select_files`.
    pub fn set_pickable_files(&self, files: Vec<SelectedFile>) {
        self.inner.borrow_mut().pickable_files = files;
    }

    /// Scripts the location fix, or clears it to simulate denial.
    pub fn set_location(&self, location: Option<GeoLocation>) {
        self.inner.borrow_mut().location = location;
    }

    /// Scripts the body returned when `fetch_url` sees `url`.
    pub fn set_url_body(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.inner.borrow_mut().url_bodies.push((url.into(), bytes));
    }

    /// Returns notifications shown so far as `(title, body)` pairs.
    pub fn notifications(&self) -> Vec<(String, String)> {
        self.inner.borrow().notifications.clone()
    }

    /// Returns completed downloads as `(filename, bytes)` pairs.
    pub fn downloads(&self) -> Vec<(String, Vec<u8>)> {
        self.inner.borrow().downloads.clone()
    }

    /// Returns URLs opened externally so far.
    pub fn opened_urls(&self) -> Vec<String> {
        self.inner.borrow().opened_urls.clone()
    }

    /// Returns whether a recording is currently active.
    pub fn recording_active(&self) -> bool {
        self.inner.borrow().recording_active
    }
}

impl HardwareService for MemoryHardwareService {
    fn start_audio_recording<'a>(&'a self) -> HardwareFuture<'a, Result<bool, HardwareError>> {
        Box::pin(async move {
            self.inner.borrow_mut().recording_active = true;
            Ok(true)
        })
    }

    fn stop_audio_recording<'a>(
        &'a self,
        filename: Option<&'a str>,
    ) -> HardwareFuture<'a, Result<Option<AudioRecording>, HardwareError>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            state.recording_active = false;
            let mut recording = state.next_recording.take();
            if let (Some(recording), Some(filename)) = (recording.as_mut(), filename) {
                recording.filename = filename.to_string();
            }
            Ok(recording)
        })
    }

    fn select_files<'a>(
        &'a self,
        _options: &'a FileSelectOptions,
    ) -> HardwareFuture<'a, Result<Vec<SelectedFile>, HardwareError>> {
        Box::pin(async move { Ok(self.inner.borrow().pickable_files.clone()) })
    }

    fn current_location<'a>(
        &'a self,
    ) -> HardwareFuture<'a, Result<Option<GeoLocation>, HardwareError>> {
        Box::pin(async move { Ok(self.inner.borrow().location) })
    }

    fn show_notification<'a>(
        &'a self,
        title: &'a str,
        body: &'a str,
    ) -> HardwareFuture<'a, Result<bool, HardwareError>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .notifications
                .push((title.to_string(), body.to_string()));
            Ok(true)
        })
    }

    fn fetch_url<'a>(&'a self, url: &'a str) -> HardwareFuture<'a, Result<Vec<u8>, HardwareError>> {
        Box::pin(async move {
            self.inner
                .borrow()
                .url_bodies
                .iter()
                .find(|(stored, _)| stored == url)
                .map(|(_, bytes)| bytes.clone())
                .ok_or_else(|| HardwareError::Failed(format!("no scripted body for {url}")))
        })
    }

    fn download_file<'a>(
        &'a self,
        bytes: Vec<u8>,
        filename: &'a str,
    ) -> HardwareFuture<'a, Result<(), HardwareError>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .downloads
                .push((filename.to_string(), bytes));
            Ok(())
        })
    }

    fn open_external_url<'a>(
        &'a self,
        url: &'a str,
    ) -> HardwareFuture<'a, Result<(), HardwareError>> {
        Box::pin(async move {
            self.inner.borrow_mut().opened_urls.push(url.to_string());
            Ok(())
        })
    }
}
