//! File-backed [`CookieJar`] that persists cookies across process restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{Cookie, CookieJar, StoreError},
};

/// Persists cookies to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileCookieJar {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<String, Cookie>>>,
}
impl FileCookieJar {
	/// Opens (or creates) a jar at the provided path, eagerly loading existing cookies.
	///
	/// Cookies that already expired are dropped while loading.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let mut snapshot = if path.exists() { Self::load_snapshot(&path)? } else { HashMap::new() };
		let now = OffsetDateTime::now_utc();

		snapshot.retain(|_, cookie| !cookie.is_expired_at(now));

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<String, Cookie>, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let cookies: Vec<Cookie> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(cookies.into_iter().map(|cookie| (cookie.name.clone(), cookie)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create cookie directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &HashMap<String, Cookie>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let mut snapshot = contents.values().collect::<Vec<_>>();

		snapshot.sort_by(|a, b| a.name.cmp(&b.name));

		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize cookie snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl CookieJar for FileCookieJar {
	fn get(&self, name: &str) -> Result<Option<Cookie>, StoreError> {
		let cookie = self.inner.read().get(name).cloned();

		Ok(cookie.filter(|cookie| !cookie.is_expired()))
	}

	fn set(&self, cookie: Cookie) -> Result<(), StoreError> {
		let mut guard = self.inner.write();

		guard.insert(cookie.name.clone(), cookie);

		self.persist_locked(&guard)
	}

	fn remove(&self, name: &str, _path: &str) -> Result<(), StoreError> {
		let mut guard = self.inner.write();

		if guard.remove(name).is_some() {
			self.persist_locked(&guard)?;
		}

		Ok(())
	}
}
