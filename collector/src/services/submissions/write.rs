use crate::config::CollectorConfig;
use crate::coordinator::IoCoordinator;
use crate::error::{CollectorError, CollectorResult};
use crate::fs::FileStore;
use crate::services::submissions::versions::{filename_of, versioned_name};
use crate::validate::FileValidator;
use chrono::Utc;
use common::model::submission::{base_filename, Submission};
use common::model::task::{sanitize_component, Task, VersioningMode};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// One incoming submission file, ready to be landed on disk.
pub struct StoreRequest<'a> {
    /// Task collection folder the file belongs in.
    pub folder: &'a Path,
    /// Base filename derived from the submitter's identity fields plus the
    /// original extension, see `common::model::submission::base_filename`.
    pub base_filename: &'a str,
    pub bytes: &'a [u8],
    pub mode: VersioningMode,
    /// Extension allow-list of the task. Empty means upload validation is
    /// handled upstream and the writer skips the content checks.
    pub allowed_extensions: &'a [String],
}

/// One client submission as it arrives from the outer surface.
pub struct IncomingSubmission<'a> {
    pub submitter_name: &'a str,
    pub contact: &'a str,
    pub department: &'a str,
    pub original_filename: &'a str,
    pub bytes: &'a [u8],
    pub client_addr: Option<&'a str>,
    /// Optional attachment as (original filename, content).
    pub attachment: Option<(&'a str, &'a [u8])>,
}

/// Lands incoming files in the collection tree.
///
/// The writer decides the on-disk name according to the task's versioning
/// mode and performs the write while holding the global I/O lock, so two
/// concurrent uploads can never probe the same free slot or interleave with
/// a running merge pass. The content is staged in a temporary file and
/// atomically finalized: a crash mid-write never leaves a path that a later
/// merge mistakes for a complete submission.
pub struct VersionedWriter<F, V> {
    fs: F,
    validator: V,
    lock: IoCoordinator,
}

impl<F: FileStore, V: FileValidator> VersionedWriter<F, V> {
    pub fn new(fs: F, validator: V, lock: IoCoordinator) -> Self {
        VersionedWriter {
            fs,
            validator,
            lock,
        }
    }

    /// Writes the submission and returns the path it finalized at.
    ///
    /// Overwrite mode silently replaces `folder/base`; AutoVersion probes
    /// `base`, `base_v1`, `base_v2`, … and takes the first free slot, with
    /// no upper bound on the suffix.
    pub async fn store(&self, req: StoreRequest<'_>) -> CollectorResult<PathBuf> {
        if !req.allowed_extensions.is_empty() {
            let ext = extension_of(req.base_filename);
            if !self
                .validator
                .extension_allowed(ext, req.allowed_extensions)
            {
                return Err(CollectorError::SubmissionRejected {
                    reason: format!("extension '{}' is not allowed", ext),
                });
            }
            if !self.validator.magic_matches(req.bytes, ext) {
                return Err(CollectorError::SubmissionRejected {
                    reason: format!("content does not look like a '{}' file", ext),
                });
            }
        }

        let _guard = self.lock.acquire().await;
        self.fs.create_dir_all(req.folder)?;

        let target = match req.mode {
            VersioningMode::Overwrite => req.folder.join(req.base_filename),
            VersioningMode::AutoVersion => self.next_free_slot(req.folder, req.base_filename),
        };
        debug!("storing submission at {}", target.display());
        self.fs.write_atomic(&target, req.bytes)?;
        info!(
            "stored submission {} ({} bytes)",
            target.display(),
            req.bytes.len()
        );
        Ok(target)
    }

    /// Full acceptance pipeline for one client submission.
    ///
    /// Validates the submitter fields and the task state, derives the base
    /// filename from the submitter identity, lands the main file (and the
    /// optional attachment) in the task's folders, and returns the
    /// immutable [`Submission`] record for the caller to report to the
    /// task registry.
    pub async fn accept(
        &self,
        config: &CollectorConfig,
        task: &Task,
        incoming: IncomingSubmission<'_>,
    ) -> CollectorResult<Submission> {
        validate_submitter(
            incoming.submitter_name,
            incoming.contact,
            incoming.department,
        )?;
        if !task.is_active {
            return Err(CollectorError::SubmissionRejected {
                reason: "task is not active".to_string(),
            });
        }
        if task.is_full() {
            return Err(CollectorError::SubmissionRejected {
                reason: "task has reached its submission limit".to_string(),
            });
        }
        if incoming.attachment.is_some() && !task.allow_attachments {
            return Err(CollectorError::SubmissionRejected {
                reason: "task does not accept attachments".to_string(),
            });
        }

        let ext = extension_of(incoming.original_filename);
        let base = base_filename(
            incoming.submitter_name,
            incoming.contact,
            incoming.department,
            ext,
        );
        let folder = config.collection_dir(task);
        let stored = self
            .store(StoreRequest {
                folder: &folder,
                base_filename: &base,
                bytes: incoming.bytes,
                mode: task.versioning,
                allowed_extensions: &task.allowed_extensions,
            })
            .await?;

        let mut attachment_path = None;
        if let Some((att_name, att_bytes)) = incoming.attachment {
            let att_base = format!(
                "{}_{}",
                sanitize_component(incoming.submitter_name),
                sanitize_component(att_name)
            );
            let att_dir = config.attachment_dir(task);
            let att_stored = self
                .store(StoreRequest {
                    folder: &att_dir,
                    base_filename: &att_base,
                    bytes: att_bytes,
                    mode: task.versioning,
                    allowed_extensions: &task.allowed_extensions,
                })
                .await?;
            attachment_path = Some(format!("attachments/{}", filename_of(&att_stored)));
        }

        Ok(Submission {
            task_id: task.id.clone(),
            submitter_name: incoming.submitter_name.to_string(),
            contact: incoming.contact.to_string(),
            department: incoming.department.to_string(),
            original_filename: incoming.original_filename.to_string(),
            stored_filename: filename_of(&stored).to_string(),
            submitted_at: Utc::now(),
            client_addr: incoming.client_addr.map(|a| a.to_string()),
            attachment_path,
        })
    }

    /// Removes one stored submission file, for the operator-side delete.
    ///
    /// Other versioned copies of the same logical file are left alone; a
    /// later merge simply selects the latest of whatever remains.
    pub async fn discard(&self, folder: &Path, stored_filename: &str) -> CollectorResult<()> {
        let _guard = self.lock.acquire().await;
        self.fs.remove_file(&folder.join(stored_filename))?;
        info!("discarded submission {}", stored_filename);
        Ok(())
    }

    fn next_free_slot(&self, folder: &Path, base_filename: &str) -> PathBuf {
        let mut n = 0u32;
        loop {
            let candidate = folder.join(versioned_name(base_filename, n));
            if !self.fs.file_exists(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn extension_of(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[idx..],
        _ => "",
    }
}

/// Field checks applied to the submitter identity before anything touches
/// the disk: name and department must be non-empty, the contact must be 3 to
/// 15 digits.
pub fn validate_submitter(name: &str, contact: &str, department: &str) -> CollectorResult<()> {
    if name.trim().is_empty() {
        return Err(CollectorError::SubmissionRejected {
            reason: "submitter name is empty".to_string(),
        });
    }
    if department.trim().is_empty() {
        return Err(CollectorError::SubmissionRejected {
            reason: "department is empty".to_string(),
        });
    }
    let digits = contact.chars().all(|c| c.is_ascii_digit());
    if !digits || contact.len() < 3 || contact.len() > 15 {
        return Err(CollectorError::SubmissionRejected {
            reason: "contact must be 3-15 digits".to_string(),
        });
    }
    Ok(())
}
