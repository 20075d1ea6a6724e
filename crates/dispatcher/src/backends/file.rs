//! FileBroadcaster - drops each message into its own directory on disk
//!
//! Connection string:
//! `file:///path/to/outbox?format=png|jpeg&quality=1..100&testing=bool&dryrun=bool`

use async_trait::async_trait;
use chrono::Utc;
use contracts::{Broadcaster, CancellationToken, ContractError, Message, Uid};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::DispatcherError;
use crate::registry::BroadcasterRegistry;

const SCHEME: &str = "file";

/// Entry names are `<millis>-<seq>`, with `seq` shared by every instance in the process
static ENTRY_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Attempts at a fresh entry name before giving up
const MAX_ENTRY_ATTEMPTS: usize = 16;

const TESTING_PREFIX: &str =
    "this is a test and there may be more / please disregard and apologies for the distraction / meanwhile: ";

/// Image encoding for attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Lossless PNG
    #[default]
    Png,
    /// JPEG at the configured quality
    Jpeg,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Configuration for FileBroadcaster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBroadcasterConfig {
    /// Base output directory
    pub base_path: PathBuf,
    /// Attachment encoding
    pub format: OutputFormat,
    /// JPEG quality (1..=100)
    pub quality: u8,
    /// Prefix bodies with a disregard notice
    pub testing: bool,
    /// Log instead of writing
    pub dryrun: bool,
}

impl FileBroadcasterConfig {
    /// Create config from a `file://` connection string
    pub fn from_uri(uri: &str) -> Result<Self, ContractError> {
        let url = Url::parse(uri)
            .map_err(|e| ContractError::invalid_parameter(SCHEME, "uri", e.to_string()))?;

        let base_path = url.to_file_path().map_err(|()| {
            ContractError::invalid_parameter(SCHEME, "path", format!("'{uri}' is not a local path"))
        })?;
        if base_path.parent().is_none() {
            return Err(ContractError::invalid_parameter(
                SCHEME,
                "path",
                "missing output directory",
            ));
        }

        let mut config = Self {
            base_path,
            format: OutputFormat::default(),
            quality: 100,
            testing: false,
            dryrun: false,
        };

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "format" => {
                    config.format = match value.to_ascii_lowercase().as_str() {
                        "png" => OutputFormat::Png,
                        "jpeg" | "jpg" => OutputFormat::Jpeg,
                        other => {
                            return Err(ContractError::invalid_parameter(
                                SCHEME,
                                "format",
                                format!("unknown format '{other}'"),
                            ))
                        }
                    }
                }
                "quality" => {
                    config.quality = value
                        .parse::<u8>()
                        .ok()
                        .filter(|q| (1..=100).contains(q))
                        .ok_or_else(|| {
                            ContractError::invalid_parameter(
                                SCHEME,
                                "quality",
                                format!("expected an integer in 1..=100, got '{value}'"),
                            )
                        })?;
                }
                "testing" => config.testing = parse_bool("testing", &value)?,
                "dryrun" => config.dryrun = parse_bool("dryrun", &value)?,
                _ => debug!(param = %key, "Ignoring unknown file broadcaster parameter"),
            }
        }

        Ok(config)
    }
}

fn parse_bool(param: &str, value: &str) -> Result<bool, ContractError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        _ => Err(ContractError::invalid_parameter(
            SCHEME,
            param,
            format!("expected a boolean, got '{value}'"),
        )),
    }
}

/// Record written next to the attachments
#[derive(Debug, Serialize)]
struct MessageRecord<'a> {
    title: &'a str,
    body: &'a str,
    images: Vec<String>,
    created_at: String,
}

/// Broadcaster that writes messages to disk
pub struct FileBroadcaster {
    config: FileBroadcasterConfig,
}

impl FileBroadcaster {
    /// Create a new FileBroadcaster, creating the base directory unless in dry-run mode
    pub fn new(config: FileBroadcasterConfig) -> std::io::Result<Self> {
        if !config.dryrun {
            fs::create_dir_all(&config.base_path)?;
        }

        Ok(Self { config })
    }

    /// Create from a connection string (for the registry)
    pub fn from_uri(uri: &str) -> Result<Self, ContractError> {
        let config = FileBroadcasterConfig::from_uri(uri)?;
        Ok(Self::new(config)?)
    }

    /// Current configuration
    pub fn config(&self) -> &FileBroadcasterConfig {
        &self.config
    }

    fn next_entry_name() -> String {
        let seq = ENTRY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{}-{seq}", Utc::now().timestamp_millis())
    }

    /// Create a directory no other writer owns
    ///
    /// `create_dir` fails on an existing directory, so a name already taken
    /// (by another process sharing the outbox) moves on to the next one.
    fn create_entry(&self) -> std::io::Result<(String, PathBuf)> {
        fs::create_dir_all(&self.config.base_path)?;

        let mut last_err = None;
        for _ in 0..MAX_ENTRY_ATTEMPTS {
            let entry = Self::next_entry_name();
            let dir = self.config.base_path.join(&entry);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok((entry, dir)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(entry = %entry, "Entry already exists, trying next name");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| std::io::ErrorKind::AlreadyExists.into()))
    }

    async fn write_entry(
        &self,
        ctx: &CancellationToken,
        dir: &Path,
        msg: &Message,
        body: &str,
    ) -> Result<(), ContractError> {
        self.write_record(dir, msg, body)?;

        for idx in 0..msg.images.len() {
            if ctx.is_cancelled() {
                return Err(ContractError::Cancelled);
            }

            let images = Arc::clone(&msg.images);
            let path = dir.join(self.image_file_name(idx));
            let (format, quality) = (self.config.format, self.config.quality);

            tokio::task::spawn_blocking(move || save_image(&images[idx], &path, format, quality))
                .await
                .map_err(|e| {
                    ContractError::delivery(SCHEME, format!("image encoder task failed: {e}"))
                })?
                .map_err(|e| {
                    ContractError::delivery(SCHEME, format!("failed to encode image {idx}: {e}"))
                })?;
        }
        Ok(())
    }

    fn body_for(&self, msg: &Message) -> String {
        if self.config.testing {
            format!("{TESTING_PREFIX}{}", msg.body)
        } else {
            msg.body.clone()
        }
    }

    fn write_record(&self, dir: &Path, msg: &Message, body: &str) -> std::io::Result<()> {
        let images = (0..msg.images.len())
            .map(|idx| self.image_file_name(idx))
            .collect();
        let record = MessageRecord {
            title: &msg.title,
            body,
            images,
            created_at: Utc::now().to_rfc3339(),
        };

        let file = File::create(dir.join("message.json"))?;
        serde_json::to_writer_pretty(file, &record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    fn image_file_name(&self, idx: usize) -> String {
        format!("image-{idx}.{}", self.config.format.extension())
    }
}

/// Constructor for `file://`
pub async fn new_file_broadcaster(
    _ctx: CancellationToken,
    uri: String,
) -> Result<Box<dyn Broadcaster>, ContractError> {
    Ok(Box::new(FileBroadcaster::from_uri(&uri)?))
}

/// Register the `file` scheme
pub fn register(registry: &BroadcasterRegistry) -> Result<(), DispatcherError> {
    registry.register(SCHEME, new_file_broadcaster)
}

fn save_image(
    image: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    quality: u8,
) -> Result<(), image::ImageError> {
    match format {
        OutputFormat::Png => image.save_with_format(path, image::ImageFormat::Png),
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let mut writer = BufWriter::new(File::create(path)?);
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
        }
    }
}

#[async_trait]
impl Broadcaster for FileBroadcaster {
    fn name(&self) -> &str {
        SCHEME
    }

    #[instrument(
        name = "file_broadcaster_broadcast",
        skip(self, ctx, msg),
        fields(base_path = %self.config.base_path.display(), images = msg.images.len())
    )]
    async fn broadcast_message(
        &self,
        ctx: &CancellationToken,
        msg: &Message,
    ) -> Result<Uid, ContractError> {
        let body = self.body_for(msg);

        if self.config.dryrun {
            info!(title = %msg.title, body = %body, "Dryrun, nothing written");
            return Ok(Uid::from("dryrun"));
        }

        if ctx.is_cancelled() {
            return Err(ContractError::Cancelled);
        }

        let (entry, dir) = self.create_entry()?;
        if let Err(e) = self.write_entry(ctx, &dir, msg, &body).await {
            // Never leave a half-written entry behind
            if let Err(cleanup) = fs::remove_dir_all(&dir) {
                warn!(entry = %entry, error = %cleanup, "Failed to remove incomplete entry");
            }
            return Err(e);
        }

        debug!(entry = %entry, "Message written");
        Ok(Uid::String(entry))
    }
}
