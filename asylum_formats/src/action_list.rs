use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, ensure};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::MmapOptions;
use serde::{Deserialize, Serialize};

/// Every script stores this many command slots, used or not.
pub const MAX_ACTION_COMMANDS: usize = 161;
pub const COMMAND_PARAMS: usize = 9;
pub const ACTION_COMMAND_SIZE: usize = 4 * (2 + COMMAND_PARAMS);
pub const SCRIPT_RECORD_SIZE: usize = MAX_ACTION_COMMANDS * ACTION_COMMAND_SIZE + 3 * 4;

const HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptCommand {
    pub num_lines: i32,
    pub opcode: i32,
    pub params: [i32; COMMAND_PARAMS],
}

impl ScriptCommand {
    pub fn new(opcode: i32, params: &[i32]) -> Self {
        let mut command = ScriptCommand {
            num_lines: 0,
            opcode,
            params: [0; COMMAND_PARAMS],
        };
        for (slot, value) in command.params.iter_mut().zip(params) {
            *slot = *value;
        }
        command
    }

    /// One-based parameter access, `param(1)` through `param(9)`.
    pub fn param(&self, index: usize) -> i32 {
        self.params[index - 1]
    }

    fn read(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let num_lines = cursor.read_i32::<LittleEndian>()?;
        let opcode = cursor.read_i32::<LittleEndian>()?;
        let mut params = [0; COMMAND_PARAMS];
        cursor.read_i32_into::<LittleEndian>(&mut params)?;
        Ok(ScriptCommand {
            num_lines,
            opcode,
            params,
        })
    }

    fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_i32::<LittleEndian>(self.num_lines)?;
        out.write_i32::<LittleEndian>(self.opcode)?;
        for value in self.params {
            out.write_i32::<LittleEndian>(value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRecord {
    pub commands: Vec<ScriptCommand>,
    pub reserved: i32,
    /// General-purpose value persisted across runs of the script.
    pub value: i32,
    pub counter: i32,
}

impl ScriptRecord {
    pub fn new(commands: Vec<ScriptCommand>) -> Self {
        ScriptRecord {
            commands,
            reserved: 0,
            value: 0,
            counter: 0,
        }
    }

    fn read(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut commands = Vec::with_capacity(MAX_ACTION_COMMANDS);
        for line in 0..MAX_ACTION_COMMANDS {
            let command =
                ScriptCommand::read(cursor).with_context(|| format!("reading command {line}"))?;
            commands.push(command);
        }
        Ok(ScriptRecord {
            commands,
            reserved: cursor.read_i32::<LittleEndian>()?,
            value: cursor.read_i32::<LittleEndian>()?,
            counter: cursor.read_i32::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        ensure!(
            self.commands.len() <= MAX_ACTION_COMMANDS,
            "script holds {} commands, at most {MAX_ACTION_COMMANDS} fit",
            self.commands.len()
        );
        for command in &self.commands {
            command.write(out)?;
        }
        for _ in self.commands.len()..MAX_ACTION_COMMANDS {
            ScriptCommand::default().write(out)?;
        }
        out.write_i32::<LittleEndian>(self.reserved)?;
        out.write_i32::<LittleEndian>(self.value)?;
        out.write_i32::<LittleEndian>(self.counter)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionListPack {
    pub declared_size: i32,
    pub scripts: Vec<ScriptRecord>,
}

impl ActionListPack {
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() >= HEADER_SIZE,
            "action list is too small to contain a header"
        );
        let mut cursor = Cursor::new(bytes);
        let declared_size = cursor.read_i32::<LittleEndian>()?;
        let count = cursor.read_i32::<LittleEndian>()?;
        ensure!(count >= 0, "action list declares negative script count {count}");

        let count = count as usize;
        let body = count
            .checked_mul(SCRIPT_RECORD_SIZE)
            .ok_or_else(|| anyhow!("action list script count overflow"))?;
        ensure!(
            bytes.len() >= HEADER_SIZE + body,
            "action list truncated: {count} scripts need {} bytes, found {}",
            HEADER_SIZE + body,
            bytes.len()
        );

        let mut scripts = Vec::with_capacity(count);
        for index in 0..count {
            let script =
                ScriptRecord::read(&mut cursor).with_context(|| format!("reading script {index}"))?;
            scripts.push(script);
        }

        Ok(ActionListPack {
            declared_size,
            scripts,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.scripts.len() * SCRIPT_RECORD_SIZE);
        out.write_i32::<LittleEndian>(self.declared_size)?;
        out.write_i32::<LittleEndian>(self.scripts.len() as i32)?;
        for (index, script) in self.scripts.iter().enumerate() {
            script
                .write(&mut out)
                .with_context(|| format!("encoding script {index}"))?;
        }
        Ok(out)
    }
}

#[derive(Debug)]
pub struct ActionListFile {
    path: PathBuf,
    pack: ActionListPack,
}

impl ActionListFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)
            .with_context(|| format!("opening action list at {}", path_buf.display()))?;
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("memory-mapping action list {}", path_buf.display()))?;
        let pack = ActionListPack::parse_bytes(&mmap)
            .with_context(|| format!("parsing action list {}", path_buf.display()))?;
        Ok(ActionListFile {
            path: path_buf,
            pack,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pack(&self) -> &ActionListPack {
        &self.pack
    }

    pub fn into_pack(self) -> ActionListPack {
        self.pack
    }
}
