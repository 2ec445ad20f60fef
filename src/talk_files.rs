use crate::compressed_words::CompressedWordTable;
use crate::error::TalkError;
use crate::lexer;
use crate::script::ScriptLine;
use crate::talk_script::TalkScript;
use indexmap::IndexMap;
use log::{error, info};
use serde::Deserialize;

/// Size of one (npc index, file offset) record in the entry table
const ENTRY_SIZE: usize = 4;

/// One per-map talk container, cut into raw per-NPC byte blocks.
///
/// Layout: a little-endian u16 count of NPC entries, that many 4-byte
/// records of (u16 NPC index, u16 file offset), then the concatenated raw
/// script blocks. A block runs from its offset to the next entry's offset,
/// or to end of file for the last entry.
pub struct TalkFile {
    chunks: IndexMap<u16, Vec<u8>>,
}

impl TalkFile {
    pub fn parse(bytes: &[u8]) -> Result<TalkFile, TalkError> {
        if bytes.len() < 2 {
            return Err(TalkError::MalformedContainer(
                "file is too short to hold an entry count".to_string(),
            ));
        }
        let entries = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
        let table_end = 2 + entries * ENTRY_SIZE;
        if bytes.len() < table_end {
            return Err(TalkError::MalformedContainer(format!(
                "entry table needs {} bytes but the file has {}",
                table_end,
                bytes.len()
            )));
        }

        let mut records = Vec::with_capacity(entries);
        for n in 0..entries {
            let at = 2 + n * ENTRY_SIZE;
            let npc = u16::from_le_bytes([bytes[at], bytes[at + 1]]);
            let offset = u16::from_le_bytes([bytes[at + 2], bytes[at + 3]]) as usize;
            if offset > bytes.len() {
                return Err(TalkError::MalformedContainer(format!(
                    "NPC {} starts at {} past the end of the file",
                    npc, offset
                )));
            }
            records.push((npc, offset));
        }

        let mut chunks = IndexMap::with_capacity(entries);
        for (n, &(npc, offset)) in records.iter().enumerate() {
            let end = match records.get(n + 1) {
                Some(&(_, next_offset)) => next_offset,
                None => bytes.len(),
            };
            if end < offset {
                return Err(TalkError::MalformedContainer(format!(
                    "offsets run backwards at NPC {}",
                    npc
                )));
            }
            chunks.insert(npc, bytes[offset..end].to_vec());
        }

        Ok(TalkFile { chunks })
    }

    pub fn npc_count(&self) -> usize {
        self.chunks.len()
    }

    /// The raw byte block for one NPC
    pub fn chunk(&self, npc: u16) -> Option<&[u8]> {
        self.chunks.get(&npc).map(Vec::as_slice)
    }

    /// All (NPC index, raw block) pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (u16, &[u8])> {
        self.chunks.iter().map(|(npc, chunk)| (*npc, chunk.as_slice()))
    }
}

/// Custom dialogue deserializes to bare lines and is processed afterwards,
/// exactly like a raw byte decode
#[derive(Deserialize)]
struct RawTalkScript {
    script_lines: Vec<ScriptLine>,
}

/// Every NPC's talk script, decoded once at load time.
///
/// Scripts come from two origins: raw .TLK byte blocks and pre-structured
/// custom dialogue supplied as JSON. Both run through the same structuring
/// pass and are served identically. One bad script never blocks the rest of
/// a map from loading; it is reported and skipped.
pub struct TalkScripts {
    words: CompressedWordTable,
    scripts: IndexMap<String, IndexMap<u16, TalkScript>>,
    custom: IndexMap<String, TalkScript>,
}

impl TalkScripts {
    pub fn new(words: CompressedWordTable) -> TalkScripts {
        TalkScripts {
            words,
            scripts: IndexMap::new(),
            custom: IndexMap::new(),
        }
    }

    /// The shared word table, read-only once built
    pub fn compressed_words(&self) -> &CompressedWordTable {
        &self.words
    }

    /// Decode every NPC in one map's talk container. Returns how many
    /// scripts were loaded; NPCs whose scripts fail to decode are logged
    /// with their identity and skipped.
    pub fn load_talk_file(&mut self, map_name: &str, bytes: &[u8]) -> Result<usize, TalkError> {
        let talk_file = TalkFile::parse(bytes)?;
        let mut map_scripts = IndexMap::with_capacity(talk_file.npc_count());

        for (npc, chunk) in talk_file.iter() {
            match decode_one(chunk, &self.words) {
                Ok(script) => {
                    map_scripts.insert(npc, script);
                }
                Err(err) => error!("skipping NPC {} in {}: {}", npc, map_name, err),
            }
        }

        let loaded = map_scripts.len();
        info!(
            "{}: loaded {} of {} talk scripts",
            map_name,
            loaded,
            talk_file.npc_count()
        );
        self.scripts.insert(map_name.to_string(), map_scripts);
        Ok(loaded)
    }

    /// Load the custom dialogue overrides. Returns how many scripts were
    /// accepted; entries that fail structuring are logged and skipped.
    pub fn load_custom_dialogue(&mut self, json: &str) -> Result<usize, TalkError> {
        let raw: IndexMap<String, RawTalkScript> = serde_json::from_str(json)?;
        let mut accepted = 0;

        for (key, raw_script) in raw {
            let mut script = TalkScript::from_lines(raw_script.script_lines);
            match script.init_script() {
                Ok(()) => {
                    self.custom.insert(key, script);
                    accepted += 1;
                }
                Err(err) => error!("skipping custom dialogue \"{}\": {}", key, err),
            }
        }
        Ok(accepted)
    }

    /// The decoded script for one NPC of one map
    pub fn talk_script(&self, map_name: &str, npc: u16) -> Option<&TalkScript> {
        self.scripts.get(map_name)?.get(&npc)
    }

    /// NPC indexes with a script in the given map, in file order
    pub fn npc_indexes(&self, map_name: &str) -> Vec<u16> {
        self.scripts
            .get(map_name)
            .map(|scripts| scripts.keys().copied().collect())
            .unwrap_or_default()
    }

    /// A script from the custom dialogue origin
    pub fn custom_talk_script(&self, key: &str) -> Option<&TalkScript> {
        self.custom.get(key)
    }
}

fn decode_one(bytes: &[u8], words: &CompressedWordTable) -> Result<TalkScript, TalkError> {
    let mut script = lexer::decode_script(bytes, words)?;
    script.init_script()?;
    Ok(script)
}
