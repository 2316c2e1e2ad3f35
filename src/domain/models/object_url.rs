//! Mapping between public object URLs and bucket-relative keys.
//!
//! URLs are path-style: `scheme://authority/.../{bucket}/{key}`.

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("url: invalid format")]
pub struct InvalidObjectUrl;

/// Extracts the object key that follows the last `/{bucket_name}/` segment of
/// the URL path. Query and fragment are never part of the key.
pub fn decode_object_key(url: &str, bucket_name: &str) -> Result<String, InvalidObjectUrl> {
    if bucket_name.is_empty() {
        return Err(InvalidObjectUrl);
    }

    let parsed = Url::parse(url).map_err(|_| InvalidObjectUrl)?;
    if !parsed.has_host() {
        return Err(InvalidObjectUrl);
    }

    let path = parsed.path();
    let marker = format!("/{bucket_name}/");
    let start = path.rfind(&marker).ok_or(InvalidObjectUrl)? + marker.len();
    let raw_key = &path[start..];
    if raw_key.is_empty() {
        return Err(InvalidObjectUrl);
    }

    percent_decode_str(raw_key)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|_| InvalidObjectUrl)
}

/// Builds the public URL of `key` under `bucket_name`, appended to whatever
/// path `base` already carries.
pub fn object_url(base: &Url, bucket_name: &str, key: &str) -> Result<Url, InvalidObjectUrl> {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|_| InvalidObjectUrl)?;
        segments.pop_if_empty().push(bucket_name).extend(key.split('/'));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::file::join_key;

    #[test]
    fn decodes_key_after_bucket_segment() {
        let key = decode_object_key("https://aws.amazonaws.com/test.bucket/test/test.jpg", "test.bucket");
        assert_eq!(key, Ok("test/test.jpg".to_string()));
    }

    #[test]
    fn decodes_mybucket_scenario() {
        let key = decode_object_key("https://host/mybucket/a/b.jpg", "mybucket");
        assert_eq!(key, Ok("a/b.jpg".to_string()));
    }

    #[test]
    fn rejects_wrong_bucket() {
        let key = decode_object_key("https://aws.amazonaws.com/wrong.bucket/test/test.jpg", "test.bucket");
        assert_eq!(key, Err(InvalidObjectUrl));
    }

    #[test]
    fn rejects_bucket_without_key() {
        assert_eq!(decode_object_key("https://host/mybucket/", "mybucket"), Err(InvalidObjectUrl));
        assert_eq!(decode_object_key("https://host/mybucket", "mybucket"), Err(InvalidObjectUrl));
    }

    #[test]
    fn rejects_bucket_as_prefix_of_other_segment() {
        assert_eq!(
            decode_object_key("https://host/mybucket-old/a.jpg", "mybucket"),
            Err(InvalidObjectUrl)
        );
    }

    #[test]
    fn rejects_relative_and_hostless_urls() {
        assert_eq!(decode_object_key("mybucket/a.jpg", "mybucket"), Err(InvalidObjectUrl));
        assert_eq!(decode_object_key("unix:/mybucket/a.jpg", "mybucket"), Err(InvalidObjectUrl));
    }

    #[test]
    fn anchors_on_last_bucket_segment() {
        let key = decode_object_key("https://host/mybucket/mirror/mybucket/a.jpg", "mybucket");
        assert_eq!(key, Ok("a.jpg".to_string()));
    }

    #[test]
    fn ignores_query_and_fragment() {
        let key = decode_object_key("https://host/mybucket/a/b.jpg?versionId=3#top", "mybucket");
        assert_eq!(key, Ok("a/b.jpg".to_string()));
    }

    #[test]
    fn decoded_key_matches_encoded_key() {
        let base = Url::parse("https://s3.eu-central-1.amazonaws.com").unwrap();
        let cases = [
            ("test", "1mb.jpg"),
            ("", "photo.png"),
            ("nested/dir", "with space.txt"),
            ("unicode", "fichier-été.pdf"),
            ("a", "b%c?.bin"),
        ];
        for (directory, filename) in cases {
            let key = join_key(directory, filename);
            let url = object_url(&base, "photos", &key).unwrap();
            assert_eq!(decode_object_key(url.as_str(), "photos"), Ok(key));
        }
    }

    #[test]
    fn object_url_keeps_base_path_prefix() {
        let base = Url::parse("http://localhost:9000/storage/").unwrap();
        let url = object_url(&base, "bucket", "dir/a.jpg").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/storage/bucket/dir/a.jpg");
    }
}
