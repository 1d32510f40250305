use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const MANIFEST_SCHEMA_VERSION: u32 = 1;
const MIN_WIDTH: i32 = 220;
const MIN_HEIGHT: i32 = 140;

#[derive(Debug, Clone, Deserialize)]
struct ManifestBounds {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

#[derive(Debug, Clone, Deserialize)]
struct AppManifest {
    schema_version: u32,
    app_id: String,
    display_name: String,
    icon_ref: String,
    #[serde(default)]
    singleton: bool,
    #[serde(default)]
    allows_zero_windows: bool,
    #[serde(default = "default_true")]
    show_in_dock: bool,
    #[serde(default)]
    pinned: bool,
    dock_order: Option<u32>,
    default_bounds: ManifestBounds,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
struct CatalogRect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Debug, Serialize)]
struct CatalogPolicy {
    instance: &'static str,
    lifetime: &'static str,
}

#[derive(Debug, Serialize)]
struct CatalogEntry {
    id: String,
    display_name: String,
    icon_ref: String,
    default_bounds: CatalogRect,
    policy: CatalogPolicy,
    show_in_dock: bool,
    pinned_by_default: bool,
    dock_order: u32,
}

fn manifest_paths(dir: &Path) -> Vec<PathBuf> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to list {}: {err}", dir.display()));
    let mut paths = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect::<Vec<_>>();
    paths.sort();
    paths
}

fn valid_slug(raw: &str) -> bool {
    !raw.is_empty()
        && raw.as_bytes()[0].is_ascii_lowercase()
        && !raw.ends_with('-')
        && !raw.contains("--")
        && raw
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn validate(path: &Path, manifest: &AppManifest) {
    if manifest.schema_version != MANIFEST_SCHEMA_VERSION {
        panic!(
            "manifest schema mismatch in {}: expected {MANIFEST_SCHEMA_VERSION} found {}",
            path.display(),
            manifest.schema_version
        );
    }
    if !valid_slug(&manifest.app_id) {
        panic!("invalid app_id `{}` in {}", manifest.app_id, path.display());
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if stem != manifest.app_id {
        panic!(
            "manifest file {} must be named after its app_id `{}`",
            path.display(),
            manifest.app_id
        );
    }
    let bounds = &manifest.default_bounds;
    if bounds.width < MIN_WIDTH || bounds.height < MIN_HEIGHT {
        panic!(
            "default bounds in {} are below the {MIN_WIDTH}x{MIN_HEIGHT} minimum",
            path.display()
        );
    }
    if manifest.pinned && !manifest.show_in_dock {
        panic!("{} is pinned but hidden from the dock", path.display());
    }
}

fn to_entry(manifest: AppManifest) -> CatalogEntry {
    CatalogEntry {
        id: manifest.app_id,
        display_name: manifest.display_name,
        icon_ref: manifest.icon_ref,
        default_bounds: CatalogRect {
            x: manifest.default_bounds.x,
            y: manifest.default_bounds.y,
            w: manifest.default_bounds.width,
            h: manifest.default_bounds.height,
        },
        policy: CatalogPolicy {
            instance: if manifest.singleton {
                "singleton"
            } else {
                "multi-instance"
            },
            lifetime: if manifest.allows_zero_windows {
                "allows-zero-windows"
            } else {
                "quit-with-last-window"
            },
        },
        show_in_dock: manifest.show_in_dock,
        pinned_by_default: manifest.pinned,
        dock_order: manifest.dock_order.unwrap_or(u32::MAX),
    }
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let manifest_dir = crate_root.join("manifests");
    println!("cargo:rerun-if-changed={}", manifest_dir.display());

    let mut seen = BTreeSet::new();
    let mut catalog = Vec::new();
    for path in manifest_paths(&manifest_dir) {
        println!("cargo:rerun-if-changed={}", path.display());
        let raw = fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
        let manifest: AppManifest = toml::from_str(&raw)
            .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
        validate(&path, &manifest);
        if !seen.insert(manifest.app_id.clone()) {
            panic!("duplicate app_id `{}`", manifest.app_id);
        }
        catalog.push(to_entry(manifest));
    }

    let json = serde_json::to_string_pretty(&catalog).expect("serialize app catalog");
    let generated = format!(
        "/// Build-time generated app catalog JSON.\n\
pub const APP_CATALOG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("app_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
