//! Interface name and index utilities backed by sysfs.

use std::path::Path;

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

const SYS_CLASS_NET: &str = "/sys/class/net";

/// Error type for interface operations.
#[derive(Debug, thiserror::Error)]
pub enum IfError {
    #[error("interface not found: {0}")]
    NotFound(String),

    #[error("invalid interface name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IfError>;

/// Validate an interface name.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(IfError::InvalidName("empty name".to_string()));
    }

    if name.len() >= IFNAMSIZ {
        return Err(IfError::InvalidName(format!(
            "name too long (max {} chars)",
            IFNAMSIZ - 1
        )));
    }

    if name.contains('/') || name.contains('\0') {
        return Err(IfError::InvalidName(
            "name contains invalid characters".to_string(),
        ));
    }

    if name.chars().any(|c| c.is_whitespace()) {
        return Err(IfError::InvalidName("name contains whitespace".to_string()));
    }

    Ok(())
}

/// Convert an interface index to name.
pub fn index_to_name(index: u32) -> Result<String> {
    index_to_name_in(Path::new(SYS_CLASS_NET), index)
}

fn index_to_name_in(root: &Path, index: u32) -> Result<String> {
    if index == 0 {
        return Err(IfError::NotFound("index 0".to_string()));
    }

    for entry in std::fs::read_dir(root)?.flatten() {
        let path = entry.path().join("ifindex");
        if let Ok(content) = std::fs::read_to_string(&path)
            && let Ok(idx) = content.trim().parse::<u32>()
            && idx == index
        {
            return Ok(entry.file_name().to_string_lossy().to_string());
        }
    }

    Err(IfError::NotFound(format!("index {}", index)))
}

/// Convert an interface name to index.
pub fn name_to_index(name: &str) -> Result<u32> {
    name_to_index_in(Path::new(SYS_CLASS_NET), name)
}

fn name_to_index_in(root: &Path, name: &str) -> Result<u32> {
    validate(name)?;

    let content = std::fs::read_to_string(root.join(name).join("ifindex"))
        .map_err(|_| IfError::NotFound(name.to_string()))?;

    content
        .trim()
        .parse()
        .map_err(|_| IfError::NotFound(name.to_string()))
}

/// All interface names under `root`, sorted.
fn list_interfaces_in(root: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(root)?
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    Ok(names)
}

/// Pick the interface a request should use when none was named: the first
/// non-loopback interface, in name order, whose operstate is `up`.
pub fn default_interface() -> Option<(String, u32)> {
    default_interface_in(Path::new(SYS_CLASS_NET))
}

fn default_interface_in(root: &Path) -> Option<(String, u32)> {
    let names = list_interfaces_in(root).ok()?;
    names
        .into_iter()
        .filter(|name| name != "lo")
        .find(|name| {
            std::fs::read_to_string(root.join(name).join("operstate"))
                .map(|state| state.trim() == "up")
                .unwrap_or(false)
        })
        .and_then(|name| {
            let index = name_to_index_in(root, &name).ok()?;
            Some((name, index))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Fake /sys/class/net tree: (name, ifindex, operstate) per link.
    fn fake_sysfs(links: &[(&str, u32, &str)]) -> TempDir {
        let root = tempfile::tempdir().unwrap();
        for (name, index, state) in links {
            let dir = root.path().join(name);
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("ifindex"), format!("{}\n", index)).unwrap();
            fs::write(dir.join("operstate"), format!("{}\n", state)).unwrap();
        }
        root
    }

    #[test]
    fn test_validate() {
        assert!(validate("eth0").is_ok());
        assert!(validate("lo").is_ok());
        assert!(validate("veth123").is_ok());

        assert!(validate("").is_err());
        assert!(validate("this_name_is_way_too_long_for_an_interface").is_err());
        assert!(validate("eth/0").is_err());
        assert!(validate("eth 0").is_err());
    }

    #[test]
    fn test_index_and_name() {
        let sys = fake_sysfs(&[("lo", 1, "unknown"), ("eth0", 2, "up")]);
        let root = sys.path();
        assert_eq!(index_to_name_in(root, 2).unwrap(), "eth0");
        assert!(matches!(index_to_name_in(root, 7), Err(IfError::NotFound(_))));
        assert!(index_to_name_in(root, 0).is_err());
        assert_eq!(name_to_index_in(root, "lo").unwrap(), 1);
        assert!(name_to_index_in(root, "wlan0").is_err());
        assert_eq!(list_interfaces_in(root).unwrap(), vec!["eth0", "lo"]);
    }

    #[test]
    fn test_default_interface() {
        let sys = fake_sysfs(&[("lo", 1, "unknown"), ("eth0", 2, "down"), ("eth1", 3, "up")]);
        assert_eq!(default_interface_in(sys.path()), Some(("eth1".to_string(), 3)));

        let sys = fake_sysfs(&[("lo", 1, "up"), ("eth0", 2, "down")]);
        assert_eq!(default_interface_in(sys.path()), None);
    }
}
