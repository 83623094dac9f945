use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};

const SCORE_CHANGE: u8 = 0;
const SCORE_REMOVE: u8 = 1;

const IDENTITY_PLAYER: u8 = 1;
const IDENTITY_ENTITY: u8 = 2;
const IDENTITY_FAKE_PLAYER: u8 = 3;

const OPERATION_REGISTER: u8 = 0;
const OPERATION_CLEAR: u8 = 1;

/// Who a changed score belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScoreHolder {
    Player { entity_id: i64 },
    Entity { entity_id: i64 },
    FakePlayer { custom_name: String },
}

impl ScoreHolder {
    fn type_id(&self) -> u8 {
        match self {
            ScoreHolder::Player { .. } => IDENTITY_PLAYER,
            ScoreHolder::Entity { .. } => IDENTITY_ENTITY,
            ScoreHolder::FakePlayer { .. } => IDENTITY_FAKE_PLAYER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub scoreboard_id: i64,
    pub objective_name: String,
    pub score: u32,
    /// `None` for removals.
    pub holder: Option<ScoreHolder>,
}

/// A SetScore payload. All entries in one message share the same operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScoreEntries {
    Change(Vec<ScoreEntry>),
    Remove(Vec<ScoreEntry>),
}

impl Default for ScoreEntries {
    fn default() -> Self {
        ScoreEntries::Change(Vec::new())
    }
}

impl ScoreEntries {
    pub fn entries(&self) -> &[ScoreEntry] {
        match self {
            ScoreEntries::Change(entries) | ScoreEntries::Remove(entries) => entries,
        }
    }
}

pub fn write_score_entries(w: &mut PacketWriter<'_>, scores: &ScoreEntries) -> Result<()> {
    let (operation, entries) = match scores {
        ScoreEntries::Change(entries) => (SCORE_CHANGE, entries),
        ScoreEntries::Remove(entries) => (SCORE_REMOVE, entries),
    };
    w.write_u8(operation);
    w.write_list("score entries", entries, |w, entry| {
        w.write_signed_var_long(entry.scoreboard_id);
        w.write_string(&entry.objective_name)?;
        w.write_u32_le(entry.score);
        if operation == SCORE_REMOVE {
            return Ok(());
        }
        let holder = entry.holder.as_ref().ok_or_else(|| {
            CodecError::invalid("score holder", "changed score without a holder")
        })?;
        w.write_u8(holder.type_id());
        match holder {
            ScoreHolder::Player { entity_id } | ScoreHolder::Entity { entity_id } => {
                w.write_signed_var_long(*entity_id)
            }
            ScoreHolder::FakePlayer { custom_name } => w.write_string(custom_name)?,
        }
        Ok(())
    })
}

/// Entries decoded before an unknown holder type are kept in `scores`.
pub fn read_score_entries_into(r: &mut PacketReader<'_>, scores: &mut ScoreEntries) -> Result<()> {
    let operation = r.read_u8()?;
    *scores = match operation {
        SCORE_CHANGE => ScoreEntries::Change(Vec::new()),
        SCORE_REMOVE => ScoreEntries::Remove(Vec::new()),
        other => return Err(CodecError::unknown("score operation", other)),
    };
    let count = r.read_count("score entries")?;
    for _ in 0..count {
        let scoreboard_id = r.read_signed_var_long()?;
        let objective_name = r.read_string()?;
        let score = r.read_u32_le()?;
        let holder = if operation == SCORE_REMOVE {
            None
        } else {
            Some(match r.read_u8()? {
                IDENTITY_PLAYER => ScoreHolder::Player {
                    entity_id: r.read_signed_var_long()?,
                },
                IDENTITY_ENTITY => ScoreHolder::Entity {
                    entity_id: r.read_signed_var_long()?,
                },
                IDENTITY_FAKE_PLAYER => ScoreHolder::FakePlayer {
                    custom_name: r.read_string()?,
                },
                other => return Err(CodecError::unknown("score holder", other)),
            })
        };
        let entry = ScoreEntry {
            scoreboard_id,
            objective_name,
            score,
            holder,
        };
        match scores {
            ScoreEntries::Change(entries) | ScoreEntries::Remove(entries) => entries.push(entry),
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdentityEntry {
    pub scoreboard_id: i64,
    /// Only sent when registering.
    pub entity_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IdentityEntries {
    Register(Vec<IdentityEntry>),
    Clear(Vec<IdentityEntry>),
}

impl Default for IdentityEntries {
    fn default() -> Self {
        IdentityEntries::Register(Vec::new())
    }
}

pub fn write_identity_entries(w: &mut PacketWriter<'_>, identities: &IdentityEntries) -> Result<()> {
    let (operation, entries) = match identities {
        IdentityEntries::Register(entries) => (OPERATION_REGISTER, entries),
        IdentityEntries::Clear(entries) => (OPERATION_CLEAR, entries),
    };
    w.write_u8(operation);
    w.write_list("scoreboard identities", entries, |w, entry| {
        w.write_signed_var_long(entry.scoreboard_id);
        if operation == OPERATION_REGISTER {
            w.write_signed_var_long(entry.entity_id.unwrap_or_default());
        }
        Ok(())
    })
}

pub fn read_identity_entries(r: &mut PacketReader<'_>) -> Result<IdentityEntries> {
    let operation = r.read_u8()?;
    if operation != OPERATION_REGISTER && operation != OPERATION_CLEAR {
        return Err(CodecError::unknown("scoreboard identity operation", operation));
    }
    let entries = r.read_list("scoreboard identities", |r| {
        let scoreboard_id = r.read_signed_var_long()?;
        let entity_id = if operation == OPERATION_REGISTER {
            Some(r.read_signed_var_long()?)
        } else {
            None
        };
        Ok(IdentityEntry {
            scoreboard_id,
            entity_id,
        })
    })?;
    Ok(if operation == OPERATION_REGISTER {
        IdentityEntries::Register(entries)
    } else {
        IdentityEntries::Clear(entries)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodecContext;

    fn round_trip(scores: &ScoreEntries) -> ScoreEntries {
        let ctx = CodecContext::default();
        let mut w = PacketWriter::new(&ctx);
        write_score_entries(&mut w, scores).unwrap();
        let bytes = w.into_bytes();
        let mut r = PacketReader::new(&bytes, &ctx);
        let mut decoded = ScoreEntries::default();
        read_score_entries_into(&mut r, &mut decoded).unwrap();
        assert!(!r.has_remaining());
        decoded
    }

    #[test]
    fn test_change_entries_all_holders() {
        let scores = ScoreEntries::Change(vec![
            ScoreEntry {
                scoreboard_id: 1,
                objective_name: "kills".to_string(),
                score: 12,
                holder: Some(ScoreHolder::Player { entity_id: -4 }),
            },
            ScoreEntry {
                scoreboard_id: 2,
                objective_name: "kills".to_string(),
                score: 0,
                holder: Some(ScoreHolder::Entity { entity_id: 99 }),
            },
            ScoreEntry {
                scoreboard_id: 3,
                objective_name: "deaths".to_string(),
                score: 7,
                holder: Some(ScoreHolder::FakePlayer {
                    custom_name: "§aTeam".to_string(),
                }),
            },
        ]);
        assert_eq!(round_trip(&scores), scores);
    }

    #[test]
    fn test_remove_entries_have_no_holder() {
        let scores = ScoreEntries::Remove(vec![ScoreEntry {
            scoreboard_id: 5,
            objective_name: "x".to_string(),
            score: 1,
            holder: None,
        }]);
        let ctx = CodecContext::default();
        let mut w = PacketWriter::new(&ctx);
        write_score_entries(&mut w, &scores).unwrap();
        // op, count, id, name, score
        assert_eq!(w.len(), 1 + 1 + 1 + 2 + 4);
        assert_eq!(round_trip(&scores), scores);
    }

    #[test]
    fn test_change_without_holder_rejected() {
        let ctx = CodecContext::default();
        let scores = ScoreEntries::Change(vec![ScoreEntry {
            scoreboard_id: 5,
            objective_name: "x".to_string(),
            score: 1,
            holder: None,
        }]);
        let mut w = PacketWriter::new(&ctx);
        assert!(matches!(
            write_score_entries(&mut w, &scores),
            Err(CodecError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unknown_holder_keeps_earlier_entries() {
        let ctx = CodecContext::default();
        // change, 2 entries: (id 1, "a", 3, player -1), (id 2, "b", 4, type 9)
        let bytes = [
            0, 2, 2, 1, b'a', 3, 0, 0, 0, 1, 1, 4, 1, b'b', 4, 0, 0, 0, 9,
        ];
        let mut r = PacketReader::new(&bytes, &ctx);
        let mut decoded = ScoreEntries::default();
        let err = read_score_entries_into(&mut r, &mut decoded).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(decoded.entries().len(), 1);
        assert_eq!(
            decoded.entries()[0].holder,
            Some(ScoreHolder::Player { entity_id: -1 })
        );
    }

    #[test]
    fn test_identity_entries() {
        let ctx = CodecContext::default();
        for identities in [
            IdentityEntries::Register(vec![IdentityEntry {
                scoreboard_id: 10,
                entity_id: Some(-20),
            }]),
            IdentityEntries::Clear(vec![
                IdentityEntry {
                    scoreboard_id: 10,
                    entity_id: None,
                },
                IdentityEntry {
                    scoreboard_id: 11,
                    entity_id: None,
                },
            ]),
        ] {
            let mut w = PacketWriter::new(&ctx);
            write_identity_entries(&mut w, &identities).unwrap();
            let bytes = w.into_bytes();
            let mut r = PacketReader::new(&bytes, &ctx);
            assert_eq!(read_identity_entries(&mut r).unwrap(), identities);
        }
    }
}
