//! Minimal big-endian NBT decoder, sufficient for `level.dat`.
//!
//! NBT is the game's self-describing binary tree format: a root compound of
//! named tags (ids 0-12), usually gzip-compressed on disk. This reader
//! decodes the whole tree into [`NbtValue`] and then projects the handful
//! of fields the dashboard needs into [`WorldMetadata`]. It is not a general
//! NBT library -- no Bedrock little-endian variant, no SNBT text form.

use std::collections::HashMap;
use std::io::Read;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// Largest raw seed representable without loss by a JSON consumer
/// (JavaScript safe-integer bound, 2^53 - 1).
const MAX_SAFE_SEED: i64 = (1 << 53) - 1;

#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(HashMap<String, NbtValue>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtValue {
    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        match self {
            NbtValue::Compound(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NbtValue::Byte(v) => Some(*v as i64),
            NbtValue::Short(v) => Some(*v as i64),
            NbtValue::Int(v) => Some(*v as i64),
            NbtValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NbtValue::Float(v) => Some(*v as f64),
            NbtValue::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NbtValue::String(s) => Some(s),
            _ => None,
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| CoreError::Protocol("truncated NBT data".to_string()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> CoreResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn i16(&mut self) -> CoreResult<i16> {
        let b = self.take(2)?;
        Ok(i16::from_be_bytes([b[0], b[1]]))
    }

    fn i32(&mut self) -> CoreResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i64(&mut self) -> CoreResult<i64> {
        let b = self.take(8)?;
        Ok(i64::from_be_bytes(b.try_into().expect("8 bytes")))
    }

    fn f32(&mut self) -> CoreResult<f32> {
        let b = self.take(4)?;
        Ok(f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f64(&mut self) -> CoreResult<f64> {
        let b = self.take(8)?;
        Ok(f64::from_be_bytes(b.try_into().expect("8 bytes")))
    }

    fn name(&mut self) -> CoreResult<String> {
        let len = self.i16()?;
        if len < 0 {
            return Err(CoreError::Protocol(format!("negative NBT string length {len}")));
        }
        let bytes = self.take(len as usize)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn payload(&mut self, tag: u8) -> CoreResult<NbtValue> {
        Ok(match tag {
            1 => NbtValue::Byte(self.u8()? as i8),
            2 => NbtValue::Short(self.i16()?),
            3 => NbtValue::Int(self.i32()?),
            4 => NbtValue::Long(self.i64()?),
            5 => NbtValue::Float(self.f32()?),
            6 => NbtValue::Double(self.f64()?),
            7 => {
                let len = self.i32()?.max(0) as usize;
                NbtValue::ByteArray(self.take(len)?.iter().map(|b| *b as i8).collect())
            }
            8 => NbtValue::String(self.name()?),
            9 => {
                let item_tag = self.u8()?;
                let len = self.i32()?.max(0) as usize;
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(self.payload(item_tag)?);
                }
                NbtValue::List(items)
            }
            10 => {
                let mut map = HashMap::new();
                loop {
                    let child_tag = self.u8()?;
                    if child_tag == 0 {
                        break;
                    }
                    let name = self.name()?;
                    map.insert(name, self.payload(child_tag)?);
                }
                NbtValue::Compound(map)
            }
            11 => {
                let len = self.i32()?.max(0) as usize;
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(self.i32()?);
                }
                NbtValue::IntArray(items)
            }
            12 => {
                let len = self.i32()?.max(0) as usize;
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(self.i64()?);
                }
                NbtValue::LongArray(items)
            }
            other => return Err(CoreError::Protocol(format!("unknown NBT tag {other}"))),
        })
    }
}

/// Parse a (possibly gzip-compressed) NBT blob into its root value.
pub fn parse(bytes: &[u8]) -> CoreResult<NbtValue> {
    let decompressed;
    let bytes = if bytes.starts_with(&[0x1f, 0x8b]) {
        let mut out = Vec::new();
        flate2::read::GzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(|err| CoreError::Protocol(format!("gzip: {err}")))?;
        decompressed = out;
        &decompressed
    } else {
        bytes
    };

    let mut reader = Reader { bytes, pos: 0 };
    let root_tag = reader.u8()?;
    if root_tag != 10 {
        return Err(CoreError::Protocol(format!("root tag {root_tag} is not a compound")));
    }
    let _root_name = reader.name()?;
    reader.payload(10)
}

/// World seed, as a number when it fits a JSON consumer losslessly and as
/// its decimal string otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeedValue {
    Int(i64),
    Text(String),
}

impl SeedValue {
    fn from_raw(raw: i64) -> Self {
        if raw.unsigned_abs() <= MAX_SAFE_SEED as u64 {
            SeedValue::Int(raw)
        } else {
            SeedValue::Text(raw.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spawn {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub raining: bool,
    pub rain_time: i64,
    pub thundering: bool,
    pub thunder_time: i64,
    pub clear_weather_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldBorder {
    pub size: f64,
    pub center_x: f64,
    pub center_z: f64,
}

/// The `level.dat` fields consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldMetadata {
    pub seed: Option<SeedValue>,
    pub spawn: Spawn,
    pub world_age_ticks: i64,
    pub day_time_ticks: i64,
    /// 0-3: peaceful, easy, normal, hard.
    pub difficulty: i64,
    /// 0-3: survival, creative, adventure, spectator.
    pub game_type: i64,
    pub weather: Weather,
    pub border: WorldBorder,
    pub version_name: Option<String>,
}

/// Project a `level.dat` blob into [`WorldMetadata`], defaulting any absent
/// numeric fields.
pub fn read_world_metadata(bytes: &[u8]) -> CoreResult<WorldMetadata> {
    let root = parse(bytes)?;
    let data = root.get("Data").unwrap_or(&root);

    let num = |key: &str, default: i64| data.get(key).and_then(NbtValue::as_i64).unwrap_or(default);
    let fnum = |key: &str, default: f64| data.get(key).and_then(NbtValue::as_f64).unwrap_or(default);

    // Modern saves keep the seed under WorldGenSettings, older ones at the
    // top level as RandomSeed.
    let raw_seed = data
        .get("WorldGenSettings")
        .and_then(|wgs| wgs.get("seed"))
        .and_then(NbtValue::as_i64)
        .or_else(|| data.get("RandomSeed").and_then(NbtValue::as_i64));

    Ok(WorldMetadata {
        seed: raw_seed.map(SeedValue::from_raw),
        spawn: Spawn {
            x: num("SpawnX", 0),
            y: num("SpawnY", 64),
            z: num("SpawnZ", 0),
        },
        world_age_ticks: num("Time", 0),
        day_time_ticks: num("DayTime", 0),
        difficulty: num("Difficulty", 2).clamp(0, 3),
        game_type: num("GameType", 0).clamp(0, 3),
        weather: Weather {
            raining: num("raining", 0) != 0,
            rain_time: num("rainTime", 0),
            thundering: num("thundering", 0) != 0,
            thunder_time: num("thunderTime", 0),
            clear_weather_time: num("clearWeatherTime", 0),
        },
        border: WorldBorder {
            size: fnum("BorderSize", 6.0e7),
            center_x: fnum("BorderCenterX", 0.0),
            center_z: fnum("BorderCenterZ", 0.0),
        },
        version_name: data
            .get("Version")
            .and_then(|v| v.get("Name"))
            .and_then(NbtValue::as_str)
            .map(str::to_owned),
    })
}
