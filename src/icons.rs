//! Status icon payloads.
//!
//! This module provides:
//! - The embedded template and color icon sets
//! - Three-way icon selection from connectivity state
//! - Custom icon loading from configured files
//! - PNG decoding to RGBA for backends that want raw pixels

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{CustomIcons, TrayConfig};
use crate::error::TrayError;

const ICON_ACTIVE_TEMPLATE: &[u8] = include_bytes!("../icons/status-icon-active-template.png");
const ICON_INACTIVE_TEMPLATE: &[u8] = include_bytes!("../icons/status-icon-inactive-template.png");
const ICON_EXIT_NODE_TEMPLATE: &[u8] =
    include_bytes!("../icons/status-icon-exit-node-template.png");

const ICON_ACTIVE_COLOR: &[u8] = include_bytes!("../icons/status-icon-active.png");
const ICON_INACTIVE_COLOR: &[u8] = include_bytes!("../icons/status-icon-inactive.png");
const ICON_EXIT_NODE_COLOR: &[u8] = include_bytes!("../icons/status-icon-exit-node.png");

/// Which embedded icon set to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconStyle {
    /// Monochrome icons the OS recolors to match the menu bar.
    Template,
    /// Full-color icons.
    Color,
}

impl Default for IconStyle {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Template
        } else {
            Self::Color
        }
    }
}

/// The icon a snapshot calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    Active,
    Inactive,
    ExitNode,
}

impl IconKind {
    /// Inactivity wins over exit-node use, which wins over plain active.
    pub fn for_state(online: bool, exit_node_active: bool) -> Self {
        if !online {
            return Self::Inactive;
        }
        if exit_node_active {
            return Self::ExitNode;
        }
        Self::Active
    }
}

/// The three status icons of one tray.
#[derive(Debug, Clone)]
pub struct IconSet {
    active: Cow<'static, [u8]>,
    inactive: Cow<'static, [u8]>,
    exit_node: Cow<'static, [u8]>,
    template: bool,
}

impl IconSet {
    pub fn embedded(style: IconStyle) -> Self {
        match style {
            IconStyle::Template => Self {
                active: Cow::Borrowed(ICON_ACTIVE_TEMPLATE),
                inactive: Cow::Borrowed(ICON_INACTIVE_TEMPLATE),
                exit_node: Cow::Borrowed(ICON_EXIT_NODE_TEMPLATE),
                template: true,
            },
            IconStyle::Color => Self {
                active: Cow::Borrowed(ICON_ACTIVE_COLOR),
                inactive: Cow::Borrowed(ICON_INACTIVE_COLOR),
                exit_node: Cow::Borrowed(ICON_EXIT_NODE_COLOR),
                template: false,
            },
        }
    }

    /// Build the icon set described by `config`.
    ///
    /// Custom icon files that cannot be read or are not valid PNGs fall back
    /// to the embedded icon for that slot.
    pub fn from_config(config: &TrayConfig) -> Self {
        let mut icons = Self::embedded(config.icon_style);
        if let Some(custom) = &config.custom_icons {
            icons.apply_custom(custom);
        }
        icons
    }

    fn apply_custom(&mut self, custom: &CustomIcons) {
        let slots = [
            (&custom.active, &mut self.active),
            (&custom.inactive, &mut self.inactive),
            (&custom.exit_node, &mut self.exit_node),
        ];
        for (path, slot) in slots {
            let Some(path) = path else { continue };
            match load_icon_file(path) {
                Ok(bytes) => *slot = Cow::Owned(bytes),
                Err(err) => log::warn!(
                    "Ignoring custom icon {}, using embedded icon: {}",
                    path.display(),
                    err
                ),
            }
        }
    }

    pub fn select(&self, kind: IconKind) -> &[u8] {
        match kind {
            IconKind::Active => self.active.as_ref(),
            IconKind::Inactive => self.inactive.as_ref(),
            IconKind::ExitNode => self.exit_node.as_ref(),
        }
    }

    /// Whether the icons should be handed to the OS as template images.
    pub fn is_template(&self) -> bool {
        self.template
    }
}

impl Default for IconSet {
    fn default() -> Self {
        Self::embedded(IconStyle::default())
    }
}

fn load_icon_file(path: &Path) -> Result<Vec<u8>, TrayError> {
    let bytes = fs::read(path).map_err(|e| TrayError::Icon(e.to_string()))?;
    decode_png(&bytes)?;
    Ok(bytes)
}

/// Decoded RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaIcon {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode PNG bytes into 8-bit RGBA.
///
/// Low bit depths and palettes are expanded to 8-bit samples first.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaIcon, TrayError> {
    let mut decoder = png::Decoder::new(std::io::Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| TrayError::Icon(format!("PNG decode error: {}", e)))?;

    let (color_type, _) = reader.output_color_type();
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| TrayError::Icon(format!("PNG frame error: {}", e)))?;
    let pixels = &buf[..info.buffer_size()];

    let rgba: Vec<u8> = match color_type {
        png::ColorType::Rgba => pixels.to_vec(),
        png::ColorType::Rgb => pixels
            .chunks(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => pixels
            .chunks(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        png::ColorType::Grayscale => pixels.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        // EXPAND turns palettes into RGB(A); reaching this means it did not.
        png::ColorType::Indexed => {
            return Err(TrayError::Icon("Indexed PNG not expanded".to_string()));
        }
    };

    let expected = info.width as usize * info.height as usize * 4;
    if rgba.len() != expected {
        return Err(TrayError::Icon(format!(
            "PNG decoded to {} bytes, expected {} for {}x{}",
            rgba.len(),
            expected,
            info.width,
            info.height
        )));
    }

    Ok(RgbaIcon {
        rgba,
        width: info.width,
        height: info.height,
    })
}
