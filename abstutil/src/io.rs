use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn to_json<T: Serialize>(obj: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(obj)?)
}

pub fn from_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(raw)?)
}

/// Creates any missing parent directories, then writes pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &str, obj: &T) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::create_dir_all(parent)?;
        }
    }
    let mut file = fs_err::File::create(path)?;
    file.write_all(to_json(obj)?.as_bytes())?;
    info!("Wrote {}", path);
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let raw = fs_err::read_to_string(path)?;
    from_json(&raw).with_context(|| format!("parsing {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Thing {
        name: String,
        count: usize,
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(from_json::<Thing>("{\"name\": 3}").is_err());
        let thing: Thing = from_json("{\"name\": \"x\", \"count\": 3}").unwrap();
        assert_eq!(
            thing,
            Thing {
                name: "x".to_string(),
                count: 3
            }
        );
    }

    #[test]
    fn write_then_read_file() {
        let dir = std::env::temp_dir().join("abstutil_io_test");
        let path = dir.join("nested").join("thing.json");
        let path = path.to_str().unwrap();
        let thing = Thing {
            name: "area".to_string(),
            count: 7,
        };
        write_json(path, &thing).unwrap();
        let back: Thing = read_json(path).unwrap();
        assert_eq!(back, thing);
        assert!(read_json::<Thing>("/definitely/not/here.json").is_err());
    }
}
