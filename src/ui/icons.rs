//! Shared UI icons.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[i]");
pub static PROMPT: Emoji<'_, '_> = Emoji("👉 ", ">");

// Artifacts
pub static IMAGE: Emoji<'_, '_> = Emoji("🖼️  ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
pub static FILE_DEL: Emoji<'_, '_> = Emoji("🗑️  ", "-");

// Verdicts
pub static GENUINE: Emoji<'_, '_> = Emoji("✅ ", "[GENUINE]");
pub static FORGED: Emoji<'_, '_> = Emoji("🚫 ", "[FORGED]");
