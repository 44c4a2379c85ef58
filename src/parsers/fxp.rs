use super::{check_input, preset_name_from, read_bytes, PresetParser};
use crate::error::Result;
use crate::preset::PresetData;
use std::path::Path;
use tracing::debug;

/// VST2 program (`.fxp`) and bank (`.fxb`) files.
///
/// The full file is the chunk. The `CcnK` header is only peeked at for the
/// plugin's 4-character id and, for single programs, the stored program name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FxpParser;

const EXTENSIONS: &[&str] = &[".fxp", ".fxb"];

const CHUNK_MAGIC: &[u8; 4] = b"CcnK";
const FX_MAGIC_OFFSET: usize = 8;
const FX_ID_OFFSET: usize = 16;
const PROGRAM_NAME_OFFSET: usize = 28;
const PROGRAM_NAME_LEN: usize = 28;

#[derive(Debug, Default, PartialEq, Eq)]
struct FxHeader {
    plugin_id: String,
    program_name: Option<String>,
}

fn read_header(bytes: &[u8]) -> Option<FxHeader> {
    if !bytes.starts_with(CHUNK_MAGIC) {
        return None;
    }

    let fx_magic = bytes.get(FX_MAGIC_OFFSET..FX_MAGIC_OFFSET + 4)?;
    let fx_id = bytes.get(FX_ID_OFFSET..FX_ID_OFFSET + 4)?;
    let plugin_id = if fx_id.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        String::from_utf8_lossy(fx_id).into_owned()
    } else {
        String::new()
    };

    // Regular ('FxCk') and opaque ('FPCh') programs store a name; banks don't.
    let program_name = match fx_magic {
        b"FxCk" | b"FPCh" => bytes
            .get(PROGRAM_NAME_OFFSET..PROGRAM_NAME_OFFSET + PROGRAM_NAME_LEN)
            .map(|raw| {
                let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
                String::from_utf8_lossy(&raw[..end]).trim().to_string()
            })
            .filter(|name| !name.is_empty()),
        _ => None,
    };

    Some(FxHeader {
        plugin_id,
        program_name,
    })
}

impl PresetParser for FxpParser {
    fn name(&self) -> &'static str {
        "VST2"
    }

    fn extensions(&self) -> &'static [&'static str] {
        EXTENSIONS
    }

    fn parse_file(&self, path: &Path) -> Result<Vec<PresetData>> {
        let suffix = check_input(path, "VST2 preset", EXTENSIONS)?;
        let bytes = read_bytes(path, "VST2 preset")?;
        let header = read_header(&bytes).unwrap_or_default();

        let name = header
            .program_name
            .unwrap_or_else(|| preset_name_from(path, suffix));
        let mut preset = PresetData::chunk(name, bytes).with_source(path);
        preset.plugin_id = header.plugin_id;

        debug!(
            "Read VST2 preset {:?} (plugin id {:?}, {} bytes)",
            preset.preset_name,
            preset.plugin_id,
            preset.payload_bytes().len()
        );
        Ok(vec![preset])
    }
}
