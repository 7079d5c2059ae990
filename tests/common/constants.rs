#![allow(dead_code)]

pub const GAME_1_PK: i64 = 716352;
pub const GAME_1_DATE: &str = "2023-05-01";

pub const GAME_2_PK: i64 = 716353;
pub const GAME_2_DATE: &str = "2023-05-02";

/// Rows across both fixture games.
pub const FIXTURE_PITCH_COUNT: usize = 7;

/// Incorrect calls in the fixture, worst first.
pub const WORST_CALL_IDS: [&str; 4] = ["716352|1|2", "716353|3|1", "716352|2|1", "716352|1|1"];
pub const WORST_CALL_MISSES: [f64; 4] = [10.2, 6.36, 4.56, 3.0];

pub const FEED_COLUMNS: &str = "game_pk,game_date,at_bat_number,pitch_number,pitch_type,\
release_speed,description,events,stand,inning_topbot,plate_x,plate_z,sz_bot,sz_top,pfx_x,pfx_z,\
delta_home_win_exp,pitcher_fullname,batter_fullname";
