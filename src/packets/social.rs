// Player list, game rules and scoreboards.

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::packet::Packet;
use crate::types::game_rule::{read_game_rules_into, write_game_rules, GameRule};
use crate::types::player::{read_player_records, write_player_records, PlayerRecords};
use crate::types::scoreboard::{
    read_identity_entries, read_score_entries_into, write_identity_entries, write_score_entries,
    IdentityEntries, ScoreEntries,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerList {
    pub records: PlayerRecords,
}

impl Packet for PlayerList {
    const ID: u32 = 0x3f;
    const NAME: &'static str = "PlayerList";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        write_player_records(w, &self.records)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.records = read_player_records(r)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameRulesChanged {
    pub rules: Vec<GameRule>,
}

impl Packet for GameRulesChanged {
    const ID: u32 = 0x48;
    const NAME: &'static str = "GameRulesChanged";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        write_game_rules(w, &self.rules)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        read_game_rules_into(r, &mut self.rules)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetScore {
    pub scores: ScoreEntries,
}

impl Packet for SetScore {
    const ID: u32 = 0x6c;
    const NAME: &'static str = "SetScore";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        write_score_entries(w, &self.scores)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        read_score_entries_into(r, &mut self.scores)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetScoreboardIdentity {
    pub identities: IdentityEntries,
}

impl Packet for SetScoreboardIdentity {
    const ID: u32 = 0x70;
    const NAME: &'static str = "SetScoreboardIdentity";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        write_identity_entries(w, &self.identities)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.identities = read_identity_entries(r)?;
        Ok(())
    }
}
