//! Universe dump codec.
//!
//! One big-endian byte stream: owner records, then system records, then the
//! jump adjacency table. All ids are `u32` on the wire; owner id 0 marks an
//! unowned system.

use rasterium::Color;

use crate::MapError;

/// A decoded owner record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRecord {
    pub id: u64,
    pub name: String,
    pub color: Color,
    pub npc: bool,
}

/// A decoded solar system record.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemRecord {
    pub id: u64,
    pub x: u32,
    pub y: u32,
    pub region_id: u64,
    pub constellation_id: u64,
    pub has_station: bool,
    pub sov_power: f64,
    /// 0 = unowned.
    pub owner_id: u64,
}

/// One adjacency entry of the jump table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpEntry {
    pub system_id: u64,
    pub neighbors: Vec<u64>,
}

/// A fully decoded universe dump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DumpData {
    pub owners: Vec<OwnerRecord>,
    pub systems: Vec<SystemRecord>,
    pub jumps: Vec<JumpEntry>,
}

// ============================================================================
// Decoding
// ============================================================================

/// Big-endian reader over a byte slice. Running past the end reports the
/// field being read.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], MapError> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.buf.len());
        match end {
            Some(end) => {
                let bytes = &self.buf[self.pos..end];
                self.pos = end;
                Ok(bytes)
            }
            None => Err(MapError::DataCorrupt(format!(
                "truncated input reading {} at offset {}",
                what, self.pos
            ))),
        }
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, MapError> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, MapError> {
        Ok(u16::from_be_bytes(self.take(2, what)?.try_into().unwrap()))
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, MapError> {
        Ok(u32::from_be_bytes(self.take(4, what)?.try_into().unwrap()))
    }

    fn f64(&mut self, what: &'static str) -> Result<f64, MapError> {
        Ok(f64::from_be_bytes(self.take(8, what)?.try_into().unwrap()))
    }
}

/// Decode a universe dump. Id resolution (unknown references, forbidden zero
/// endpoints) happens when the data is installed into a map.
pub fn decode_dump(bytes: &[u8]) -> Result<DumpData, MapError> {
    let mut r = Reader::new(bytes);

    let owner_count = r.u32("owner count")?;
    let mut owners = Vec::with_capacity(owner_count.min(1 << 20) as usize);
    for _ in 0..owner_count {
        let id = r.u32("owner id")? as u64;
        let name_len = r.u16("owner name length")? as usize;
        let name = String::from_utf8_lossy(r.take(name_len, "owner name")?).into_owned();
        let red = r.u32("owner red")?;
        let green = r.u32("owner green")?;
        let blue = r.u32("owner blue")?;
        let npc = r.u8("owner npc flag")? != 0;
        owners.push(OwnerRecord {
            id,
            name,
            color: Color::rgb(red as u8, green as u8, blue as u8),
            npc,
        });
    }

    let system_count = r.u32("system count")?;
    let mut systems = Vec::with_capacity(system_count.min(1 << 20) as usize);
    for _ in 0..system_count {
        let id = r.u32("system id")? as u64;
        let x = r.u32("system x")?;
        let y = r.u32("system y")?;
        let region_id = r.u32("region id")? as u64;
        let constellation_id = r.u32("constellation id")? as u64;
        let has_station = r.u8("station flag")? != 0;
        let sov_power = r.f64("sov power")?;
        let owner_id = r.u32("system owner id")? as u64;
        systems.push(SystemRecord {
            id,
            x,
            y,
            region_id,
            constellation_id,
            has_station,
            sov_power,
            owner_id,
        });
    }

    let jump_count = r.u32("jump table size")?;
    let mut jumps = Vec::with_capacity(jump_count.min(1 << 20) as usize);
    for _ in 0..jump_count {
        let system_id = r.u32("jump source id")? as u64;
        let neighbor_count = r.u32("jump neighbor count")?;
        let mut neighbors = Vec::with_capacity(neighbor_count.min(1 << 16) as usize);
        for _ in 0..neighbor_count {
            neighbors.push(r.u32("jump neighbor id")? as u64);
        }
        jumps.push(JumpEntry {
            system_id,
            neighbors,
        });
    }

    Ok(DumpData {
        owners,
        systems,
        jumps,
    })
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a universe dump. Inverse of [`decode_dump`] for in-range values.
pub fn encode_dump(data: &DumpData) -> Vec<u8> {
    let mut out = Vec::new();

    out.extend_from_slice(&(data.owners.len() as u32).to_be_bytes());
    for owner in &data.owners {
        assert!(owner.name.len() <= u16::MAX as usize, "owner name too long");
        out.extend_from_slice(&(owner.id as u32).to_be_bytes());
        out.extend_from_slice(&(owner.name.len() as u16).to_be_bytes());
        out.extend_from_slice(owner.name.as_bytes());
        out.extend_from_slice(&(owner.color.r as u32).to_be_bytes());
        out.extend_from_slice(&(owner.color.g as u32).to_be_bytes());
        out.extend_from_slice(&(owner.color.b as u32).to_be_bytes());
        out.push(owner.npc as u8);
    }

    out.extend_from_slice(&(data.systems.len() as u32).to_be_bytes());
    for system in &data.systems {
        out.extend_from_slice(&(system.id as u32).to_be_bytes());
        out.extend_from_slice(&system.x.to_be_bytes());
        out.extend_from_slice(&system.y.to_be_bytes());
        out.extend_from_slice(&(system.region_id as u32).to_be_bytes());
        out.extend_from_slice(&(system.constellation_id as u32).to_be_bytes());
        out.push(system.has_station as u8);
        out.extend_from_slice(&system.sov_power.to_be_bytes());
        out.extend_from_slice(&(system.owner_id as u32).to_be_bytes());
    }

    out.extend_from_slice(&(data.jumps.len() as u32).to_be_bytes());
    for entry in &data.jumps {
        out.extend_from_slice(&(entry.system_id as u32).to_be_bytes());
        out.extend_from_slice(&(entry.neighbors.len() as u32).to_be_bytes());
        for &neighbor in &entry.neighbors {
            out.extend_from_slice(&(neighbor as u32).to_be_bytes());
        }
    }

    out
}

// ============================================================================
// Tests
// ============================================================================
