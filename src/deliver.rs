//! Places the finished artifact in object storage or on the local filesystem.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use object_store::{aws::AmazonS3Builder, path::Path as ObjectPath, ObjectStore, PutPayload};

use crate::config::JobConfig;

/// Where the artifact ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    Bucket { bucket: String, key: String },
    Local(PathBuf),
}

impl fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryTarget::Bucket { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
            DeliveryTarget::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Picks the destination for `file_name`.
///
/// Remote delivery goes to `<bucket>/<radar>/<date>/<file_name>`. Local
/// delivery goes to the job's data directory inside a container and to
/// `origin_dir` everywhere else.
pub fn select_target(
    job: &JobConfig,
    containerized: bool,
    origin_dir: &Path,
    file_name: &str,
) -> DeliveryTarget {
    if job.aws {
        DeliveryTarget::Bucket {
            bucket: job.bucket.clone(),
            key: job.object_key(file_name),
        }
    } else if containerized {
        DeliveryTarget::Local(job.data_dir.join(file_name))
    } else {
        DeliveryTarget::Local(origin_dir.join(file_name))
    }
}

/// Hands out object stores for bucket delivery.
pub trait BucketStores {
    fn bucket_store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>>;
}

/// Authenticated S3 clients. Credentials and region come from the usual AWS
/// environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3Stores;

impl BucketStores for S3Stores {
    fn bucket_store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        tracing::info!("Creating S3 client for bucket: {}", bucket);

        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .with_context(|| format!("Failed to configure S3 client for bucket {}", bucket))?;

        Ok(Arc::new(store))
    }
}

/// One in-memory store shared by every bucket.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStores {
    pub store: Arc<object_store::memory::InMemory>,
}

#[cfg(test)]
impl BucketStores for MemoryStores {
    fn bucket_store(&self, _bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        Ok(self.store.clone())
    }
}

/// Delivers `artifact` to `target`.
pub async fn deliver(
    artifact: &Path,
    target: &DeliveryTarget,
    stores: &dyn BucketStores,
) -> Result<()> {
    match target {
        DeliveryTarget::Bucket { bucket, key } => {
            let store = stores.bucket_store(bucket)?;
            upload(store.as_ref(), key, artifact).await
        }
        DeliveryTarget::Local(destination) => copy_local(artifact, destination),
    }
}

/// Uploads the file at `artifact` to `key`.
pub async fn upload(store: &dyn ObjectStore, key: &str, artifact: &Path) -> Result<()> {
    let location = ObjectPath::parse(key).with_context(|| format!("Invalid object key {}", key))?;
    let bytes =
        fs::read(artifact).with_context(|| format!("Failed to read {}", artifact.display()))?;
    let size = bytes.len();

    store
        .put(&location, PutPayload::from(bytes))
        .await
        .with_context(|| format!("Failed to upload {}", key))?;

    tracing::info!("Uploaded {} bytes to {}", size, key);

    Ok(())
}

fn copy_local(artifact: &Path, destination: &Path) -> Result<()> {
    fs::copy(artifact, destination).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            artifact.display(),
            destination.display()
        )
    })?;

    tracing::info!("Copied {} to {}", artifact.display(), destination.display());

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use object_store::memory::InMemory;
    use tempfile::TempDir;

    use super::*;

    fn job(aws: bool) -> JobConfig {
        let mut job = JobConfig::new("KBGM", "2020/05/01").unwrap();
        job.aws = aws;
        job
    }

    #[test]
    fn should_target_bucket_when_remote() {
        let origin = Path::new("/home/user/runs");

        for containerized in [true, false] {
            assert_eq!(
                select_target(&job(true), containerized, origin, "KBGM20200501.txt.gz"),
                DeliveryTarget::Bucket {
                    bucket: "vol2bird".to_string(),
                    key: "KBGM/2020/05/01/KBGM20200501.txt.gz".to_string(),
                }
            );
        }
    }

    #[test]
    fn should_target_data_dir_in_container() {
        let target = select_target(&job(false), true, Path::new("/home/user/runs"), "KBGM20200501.txt");

        assert_eq!(target, DeliveryTarget::Local(PathBuf::from("/data/KBGM20200501.txt")));
    }

    #[test]
    fn should_target_origin_dir_on_host() {
        let target = select_target(&job(false), false, Path::new("/home/user/runs"), "KBGM20200501.txt");

        assert_eq!(
            target,
            DeliveryTarget::Local(PathBuf::from("/home/user/runs/KBGM20200501.txt"))
        );
    }

    #[test]
    fn should_display_target() {
        let target = select_target(&job(true), false, Path::new("/"), "f.txt");
        assert_eq!(target.to_string(), "s3://vol2bird/KBGM/2020/05/01/f.txt");
    }

    #[tokio::test]
    async fn should_upload_to_store() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("KBGM20200501.txt");
        fs::write(&artifact, "A\nB\n").unwrap();
        let store = InMemory::new();

        upload(&store, "KBGM/2020/05/01/KBGM20200501.txt", &artifact)
            .await
            .unwrap();

        let location = ObjectPath::parse("KBGM/2020/05/01/KBGM20200501.txt").unwrap();
        let stored = store.get(&location).await.unwrap().bytes().await.unwrap();
        assert_eq!(stored.as_ref(), b"A\nB\n");
    }

    #[tokio::test]
    async fn should_deliver_to_bucket() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("KBGM20200501.txt.gz");
        fs::write(&artifact, b"\x1f\x8bdata").unwrap();
        let stores = MemoryStores::default();
        let target = select_target(&job(true), false, dir.path(), "KBGM20200501.txt.gz");

        deliver(&artifact, &target, &stores).await.unwrap();

        let location = ObjectPath::parse("KBGM/2020/05/01/KBGM20200501.txt.gz").unwrap();
        let stored = stores.store.get(&location).await.unwrap().bytes().await.unwrap();
        assert_eq!(stored.as_ref(), b"\x1f\x8bdata");
    }

    #[tokio::test]
    async fn should_copy_locally() {
        let work = TempDir::new().unwrap();
        let origin = TempDir::new().unwrap();
        let artifact = work.path().join("KBGM20200501.txt");
        fs::write(&artifact, "A\n").unwrap();
        let target = DeliveryTarget::Local(origin.path().join("KBGM20200501.txt"));

        deliver(&artifact, &target, &MemoryStores::default()).await.unwrap();

        assert_eq!(fs::read_to_string(origin.path().join("KBGM20200501.txt")).unwrap(), "A\n");
        assert!(artifact.exists());
    }

    #[tokio::test]
    async fn should_fail_copy_to_missing_dir() {
        let work = TempDir::new().unwrap();
        let artifact = work.path().join("a.txt");
        fs::write(&artifact, "A\n").unwrap();
        let target = DeliveryTarget::Local(work.path().join("missing").join("a.txt"));

        assert!(deliver(&artifact, &target, &MemoryStores::default()).await.is_err());
    }
}
