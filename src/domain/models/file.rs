use std::fmt;
use std::str::FromStr;

/// Canned ACL applied to a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessPolicy {
    PublicRead,
    PublicReadWrite,
    AwsExecRead,
    AuthenticatedRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
    LogDeliveryWrite,
}

impl AccessPolicy {
    pub const ALL: [AccessPolicy; 7] = [
        AccessPolicy::PublicRead,
        AccessPolicy::PublicReadWrite,
        AccessPolicy::AwsExecRead,
        AccessPolicy::AuthenticatedRead,
        AccessPolicy::BucketOwnerRead,
        AccessPolicy::BucketOwnerFullControl,
        AccessPolicy::LogDeliveryWrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPolicy::PublicRead => "public-read",
            AccessPolicy::PublicReadWrite => "public-read-write",
            AccessPolicy::AwsExecRead => "aws-exec-read",
            AccessPolicy::AuthenticatedRead => "authenticated-read",
            AccessPolicy::BucketOwnerRead => "bucket-owner-read",
            AccessPolicy::BucketOwnerFullControl => "bucket-owner-full-control",
            AccessPolicy::LogDeliveryWrite => "log-delivery-write",
        }
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AccessPolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == value)
            .ok_or_else(|| value.to_string())
    }
}

/// A file to be stored, reassembled from whatever transport delivered it.
///
/// `content` is `None` when the transport never supplied a body at all, which
/// is different from an empty file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub content: Option<Vec<u8>>,
    pub directory: String,
    pub filename: String,
    pub access_policy: String,
}

impl FileUpload {
    pub fn new(
        content: Vec<u8>,
        directory: impl Into<String>,
        filename: impl Into<String>,
        access_policy: impl Into<String>,
    ) -> Self {
        Self {
            content: Some(content),
            directory: directory.into(),
            filename: filename.into(),
            access_policy: access_policy.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.as_ref().map_or(0, |c| c.len() as u64)
    }

    pub fn parsed_access_policy(&self) -> Option<AccessPolicy> {
        self.access_policy.parse().ok()
    }

    /// Bucket-relative key: the directory (if any) joined with the filename.
    pub fn object_key(&self) -> String {
        join_key(&self.directory, &self.filename)
    }
}

/// Joins key segments the way a slash-separated path join does: empty and `.`
/// segments vanish, `..` drops the previous segment and never climbs above the
/// bucket root.
pub fn join_key(directory: &str, filename: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in directory.split('/').chain(filename.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub url: String,
}

impl DeleteRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Ordered batch; it is valid only when every element is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteRequest(pub Vec<DeleteRequest>);

impl BatchDeleteRequest {
    pub fn iter(&self) -> impl Iterator<Item = &DeleteRequest> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for BatchDeleteRequest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(DeleteRequest::new).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub location_url: String,
}
