#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

use super::constants::FEED_COLUMNS;

fn body(rows: &[&str]) -> String {
    let mut out = String::from(FEED_COLUMNS);
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}

const DAY_1_ROWS: [&str; 4] = [
    // strike 3.0 in outside
    "716352,2023-05-01,1,1,FF,95.1,called_strike,,R,Top,1.20,2.5,1.5,3.5,-0.5,1.2,0.012,Logan Webb,Mookie Betts",
    // ball 10.2 in inside the zone
    "716352,2023-05-01,1,2,SL,86.4,ball,,R,Top,0.10,2.6,1.5,3.5,0.3,0.1,-0.008,Logan Webb,Mookie Betts",
    // strike 4.56 in low
    "716352,2023-05-01,2,1,SI,93.0,called_strike,,L,Top,-0.5,1.0,1.5,3.5,-1.1,0.6,0.015,Logan Webb,Freddie Freeman",
    "716352,2023-05-01,2,2,SI,92.7,hit_into_play,home_run,L,Top,-0.2,2.4,1.5,3.5,-1.0,0.7,-0.110,Logan Webb,Freddie Freeman",
];

const DAY_2_ROWS: [&str; 3] = [
    // correct calls
    "716353,2023-05-02,1,2,CU,80.3,ball,,R,Bot,1.5,2.0,1.6,3.4,0.8,-1.1,0.007,Zac Gallen,Thairo Estrada",
    "716353,2023-05-02,1,1,FF,97.2,called_strike,,R,Bot,0.2,2.5,1.6,3.4,-0.6,1.3,-0.010,Zac Gallen,Thairo Estrada",
    // strike 1.8 in inside and 4.56 in high
    "716353,2023-05-02,3,1,FF,96.8,called_strike,,R,Bot,-1.10,3.9,1.6,3.4,-0.4,1.4,-0.021,Zac Gallen,LaMonte Wade Jr.",
];

pub fn day_1_body() -> String {
    body(&DAY_1_ROWS)
}

/// Rows deliberately out of order; the merge sorts them.
pub fn day_2_body() -> String {
    body(&DAY_2_ROWS)
}

/// Day 2 plus a row already served for day 1.
pub fn day_2_body_with_repeat() -> String {
    let mut rows = DAY_2_ROWS.to_vec();
    rows.push(DAY_1_ROWS[0]);
    body(&rows)
}

/// Write a pipeline config file pointing at `feed_url`.
pub fn write_config(feed_url: &str, extra: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
analysis = ["umpire_calls", "pitch_movement", "delta_win_exp"]

[feed]
base_url = "{}"
timeout_sec = 5
max_workers = 2

[search]
start_date = "2023-05-01"
end_date = "2023-05-02"

[[steps]]
type = "query"
params = {{ query = "total_miss > 0" }}

[[steps]]
type = "rank"
params = {{ name = "miss_rank", fields = "total_miss", ascending = false }}

[[steps]]
type = "query"
params = {{ query = "miss_rank <= 3" }}

[caption]
metric = "total_miss"
{}
"#,
        feed_url, extra
    )
    .unwrap();
    file
}
