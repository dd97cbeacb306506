use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{AppError, AppResult};
use crate::graphic::{Symbol, SymbolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleVariant {
    Default,
    Selected,
}

impl StyleVariant {
    pub fn as_tag(&self) -> &'static str {
        match self {
            StyleVariant::Default => "default",
            StyleVariant::Selected => "selected",
        }
    }
}

/// Catalog of named symbol styles per symbol kind. A kind without an entry
/// is a non-fatal condition: restyling leaves such graphics untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolStyleSet {
    entries: HashMap<SymbolKind, HashMap<StyleVariant, Symbol>>,
}

impl SymbolStyleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiled-in styles covering every symbol kind the application emits.
    pub fn builtin() -> Self {
        let mut set = Self::empty();
        set.insert(
            SymbolKind::SimpleMarker,
            StyleVariant::Default,
            Symbol::new(SymbolKind::SimpleMarker, "#1976d2", 10.0),
        );
        set.insert(
            SymbolKind::SimpleMarker,
            StyleVariant::Selected,
            Symbol::new(SymbolKind::SimpleMarker, "#ff6600", 14.0),
        );
        set.insert(
            SymbolKind::SimpleLine,
            StyleVariant::Default,
            Symbol::new(SymbolKind::SimpleLine, "#1976d2", 2.0),
        );
        set.insert(
            SymbolKind::SimpleLine,
            StyleVariant::Selected,
            Symbol::new(SymbolKind::SimpleLine, "#ff6600", 3.0),
        );
        set.insert(
            SymbolKind::SimpleFill,
            StyleVariant::Default,
            Symbol::new(SymbolKind::SimpleFill, "#1976d240", 1.0),
        );
        set.insert(
            SymbolKind::SimpleFill,
            StyleVariant::Selected,
            Symbol::new(SymbolKind::SimpleFill, "#ff660040", 2.0),
        );
        set
    }

    /// Loads a style set from a JSON file, falling back to the builtin set
    /// when the file is missing or does not parse.
    pub fn load(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(set) => Ok(set),
                Err(err) => {
                    warn!(
                        target: "style",
                        error = ?err,
                        path = %path.display(),
                        "failed to parse symbol style file; using builtin styles"
                    );
                    Ok(Self::builtin())
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(
                    target: "style",
                    path = %path.display(),
                    "symbol style file not found; using builtin styles"
                );
                Ok(Self::builtin())
            }
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn insert(&mut self, kind: SymbolKind, variant: StyleVariant, symbol: Symbol) {
        self.entries.entry(kind).or_default().insert(variant, symbol);
    }

    pub fn symbol_for(&self, kind: SymbolKind, variant: StyleVariant) -> Option<&Symbol> {
        self.entries
            .get(&kind)
            .and_then(|variants| variants.get(&variant))
    }

    pub fn covers(&self, kind: SymbolKind) -> bool {
        self.entries.contains_key(&kind)
    }
}
