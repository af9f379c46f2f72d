//! Tag operations

use semver::Version;
use tracing::{debug, info, instrument};

use crate::error::GitError;
use crate::repository::{GitRepo, Result};
use crate::types::TagInfo;

impl GitRepo {
    /// Get all tags
    #[instrument(skip(self))]
    pub fn tags(&self) -> Result<Vec<TagInfo>> {
        let mut tags = Vec::new();

        self.repo.tag_foreach(|oid, name| {
            let name = String::from_utf8_lossy(name)
                .trim_start_matches("refs/tags/")
                .to_string();

            if let Ok(commit) = self.repo.find_commit(oid) {
                tags.push(TagInfo::new(&name, commit.id().to_string()));
            } else if let Ok(tag) = self.repo.find_tag(oid) {
                let mut info = TagInfo::new(&name, tag.target_id().to_string());
                if let Some(msg) = tag.message() {
                    info = info.with_message(msg.trim());
                }
                tags.push(info);
            }

            true
        })?;

        debug!(count = tags.len(), "listed all tags");
        Ok(tags)
    }

    /// The highest semantic-version tag starting with `prefix`
    #[instrument(skip(self))]
    pub fn latest_version_tag(&self, prefix: &str) -> Result<Option<TagInfo>> {
        let mut versioned: Vec<_> = self
            .tags()?
            .into_iter()
            .filter(|t| t.name.starts_with(prefix))
            .filter_map(|t| {
                let parsed = Version::parse(&t.name[prefix.len()..]).ok()?;
                Some((t, parsed))
            })
            .collect();

        versioned.sort_by(|a, b| b.1.cmp(&a.1));

        let latest = versioned.into_iter().next().map(|(t, _)| t);
        debug!(latest = ?latest.as_ref().map(|t| &t.name), "found latest version tag");
        Ok(latest)
    }

    /// Find a specific tag by name
    pub fn find_tag(&self, name: &str) -> Result<Option<TagInfo>> {
        let tag_ref = format!("refs/tags/{}", name);

        match self.repo.find_reference(&tag_ref) {
            Ok(reference) => {
                let target = reference.peel_to_commit()?;
                Ok(Some(TagInfo::new(name, target.id().to_string())))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// Create a tag at HEAD; annotated when a message is given
    #[instrument(skip(self, message), fields(annotated = message.is_some()))]
    pub fn create_tag(&self, name: &str, message: Option<&str>) -> Result<TagInfo> {
        if self.find_tag(name)?.is_some() {
            return Err(GitError::TagExists(name.to_string()));
        }

        let head = self.head_commit()?;

        match message {
            Some(msg) => {
                let sig = self.repo.signature()?;
                self.repo.tag(name, head.as_object(), &sig, msg, false)?;
            }
            None => {
                self.repo.tag_lightweight(name, head.as_object(), false)?;
            }
        }

        info!(name, "created tag");
        Ok(TagInfo::new(name, head.id().to_string()))
    }
}
