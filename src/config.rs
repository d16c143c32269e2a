// Application configuration

//! # Configuration
//!
//! Settings are layered with the `config` crate, later layers winning:
//!
//! 1. built-in defaults ([`AppConfig::default`])
//! 2. a TOML file (`wizard.toml` next to the binary, or an explicit path)
//! 3. environment variables prefixed `WIZARD_`, nested with `__`
//!    (e.g. `WIZARD_MENU__ADD_PRODUCT="New product"`,
//!    `WIZARD_CATALOG__INFO_PAGES="main,about"`)
//!
//! A `.env` file is loaded into the environment first by the binary.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::engine::WizardSettings;
use crate::models::Keyboard;
use crate::Result;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default tracing filter when `RUST_LOG` is not set
    pub log_level: String,

    /// Input meaning "keep the current value" while editing
    pub reuse_sentinel: String,

    /// Animation sent after a product is deleted
    pub deleted_animation: String,

    pub menu: MenuConfig,
    pub catalog: CatalogConfig,
}

/// Labels of the admin reply keyboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    pub add_product: String,
    pub assortment: String,
    pub banner: String,
    pub placeholder: String,
}

/// Seed data for the in-memory catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub categories: Vec<String>,
    pub info_pages: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: "info".to_string(),
            reuse_sentinel: ".".to_string(),
            deleted_animation: "h3oEjI6SIIHBdRxXI40/giphy.gif".to_string(),
            menu: MenuConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        MenuConfig {
            add_product: "Add good".to_string(),
            assortment: "Assortment".to_string(),
            banner: "Add/Change banner".to_string(),
            placeholder: "What do you want to do?".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            categories: vec!["Food".to_string(), "Drinks".to_string()],
            info_pages: ["main", "catalog", "cart", "about", "payment", "shipping"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl AppConfig {
    /// Load from the optional file and the environment
    ///
    /// With `path` set the file must exist; otherwise `wizard.toml` in the
    /// working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("wizard").required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(environment())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse a TOML document over the defaults, ignoring the environment
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// The admin reply keyboard built from the menu labels
    pub fn admin_keyboard(&self) -> Keyboard {
        Keyboard::Reply {
            buttons: vec![
                self.menu.add_product.clone(),
                self.menu.assortment.clone(),
                self.menu.banner.clone(),
            ],
            placeholder: Some(self.menu.placeholder.clone()),
            row_width: 2,
        }
    }

    pub fn wizard_settings(&self) -> WizardSettings {
        WizardSettings {
            reuse_sentinel: self.reuse_sentinel.clone(),
            admin_keyboard: self.admin_keyboard(),
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("WIZARD")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("catalog.categories")
        .with_list_parse_key("catalog.info_pages")
}
