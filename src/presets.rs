use crate::palette::{morphing_palettes, professional_palettes, Palette};
use crate::settings::BackdropMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named list of palettes, cycled in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteSet {
    pub name: String,
    pub description: String,
    pub palettes: Vec<Palette>,
}

impl PaletteSet {
    pub fn new(name: impl Into<String>, description: impl Into<String>, palettes: Vec<Palette>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            palettes,
        }
    }

    /// Read a set from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read palette set file: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse palette set file: {}", e))
    }
}

/// Built-in palette sets plus the user's own, loaded from disk
pub struct PaletteLibrary {
    pub builtin: Vec<PaletteSet>,
    pub user: Vec<PaletteSet>,
}

impl Default for PaletteLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteLibrary {
    pub fn new() -> Self {
        let mut library = Self::builtin_only();
        if let Some(dir) = Self::palettes_dir() {
            library.user = load_sets_from(&dir);
        }
        library
    }

    /// Library without any user sets
    pub fn builtin_only() -> Self {
        Self {
            builtin: vec![
                PaletteSet::new(
                    "Professional",
                    "Four calm gradients behind the particle field",
                    professional_palettes(),
                ),
                PaletteSet::new(
                    "Morphing",
                    "Five saturated gradients",
                    morphing_palettes(),
                ),
            ],
            user: Vec::new(),
        }
    }

    fn palettes_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("particle-field").join("palettes"))
    }

    /// Save a set to the user palette directory
    pub fn save_set(&mut self, set: PaletteSet) -> Result<PathBuf, String> {
        let dir = Self::palettes_dir().ok_or("Could not determine config directory")?;
        self.save_set_in(&dir, set)
    }

    pub fn save_set_in(&mut self, dir: &Path, set: PaletteSet) -> Result<PathBuf, String> {
        if set.palettes.is_empty() {
            return Err(format!("Palette set '{}' has no palettes", set.name));
        }
        fs::create_dir_all(dir).map_err(|e| format!("Failed to create palettes directory: {}", e))?;

        let path = dir.join(format!("{}.json", sanitize(&set.name)));
        let json = serde_json::to_string_pretty(&set)
            .map_err(|e| format!("Failed to serialize palette set: {}", e))?;
        fs::write(&path, json).map_err(|e| format!("Failed to write palette set file: {}", e))?;

        match self.user.iter_mut().find(|s| s.name == set.name) {
            Some(existing) => *existing = set,
            None => self.user.push(set),
        }
        Ok(path)
    }

    pub fn all_sets(&self) -> impl Iterator<Item = &PaletteSet> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a set by name, ignoring ASCII case
    pub fn find(&self, name: &str) -> Option<&PaletteSet> {
        self.all_sets().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn set_names(&self) -> Vec<&str> {
        self.all_sets().map(|s| s.name.as_str()).collect()
    }

    /// The set a backdrop uses when none is chosen
    pub fn default_for(&self, mode: BackdropMode) -> &PaletteSet {
        let name = match mode {
            BackdropMode::Morphing => "Morphing",
            _ => "Professional",
        };
        self.find(name).unwrap_or(&self.builtin[0])
    }

    /// Name of the set after `current`, wrapping around
    pub fn next_name(&self, current: &str) -> String {
        let names = self.set_names();
        let index = names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(current))
            .map(|i| (i + 1) % names.len())
            .unwrap_or(0);
        names[index].to_string()
    }
}

/// Sets from every `*.json` file in `dir` that parses and has at least one palette
fn load_sets_from(dir: &Path) -> Vec<PaletteSet> {
    let mut sets = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return sets;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().is_some_and(|e| e == "json") {
            continue;
        }
        match PaletteSet::load_from_file(&path) {
            Ok(set) if !set.palettes.is_empty() => sets.push(set),
            Ok(set) => log::warn!("skipping empty palette set '{}'", set.name),
            Err(e) => log::warn!("skipping palette file {}: {}", path.display(), e),
        }
    }
    sets.sort_by(|a, b| a.name.cmp(&b.name));
    sets
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
