// Replays detector output recorded as JSON lines, one frame per line:
//   {"timestamp_ms": 0, "width": 640, "height": 480, "joints": {...}}
// `joints` is either a landmark-name map or the detector's 33-entry array.
// A line without `joints` is a frame where nobody was detected.

use crate::models::pose::{is_valid_frame_size, BodyLandmark, CapturedFrame, Keypoint3D, PoseFrame};
use crate::platform::PoseSource;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordedJoints {
    Named(BTreeMap<BodyLandmark, Keypoint3D>),
    Indexed(Vec<Keypoint3D>),
}

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    timestamp_ms: i64,
    width: u32,
    height: u32,
    #[serde(default)]
    joints: Option<RecordedJoints>,
}

impl From<RecordedFrame> for CapturedFrame {
    fn from(record: RecordedFrame) -> Self {
        let pose = record.joints.map(|joints| match joints {
            RecordedJoints::Named(joints) => PoseFrame {
                timestamp_ms: record.timestamp_ms,
                joints,
            },
            RecordedJoints::Indexed(keypoints) => {
                PoseFrame::from_landmark_array(record.timestamp_ms, &keypoints)
            }
        });

        CapturedFrame {
            timestamp_ms: record.timestamp_ms,
            width: record.width,
            height: record.height,
            pose,
        }
    }
}

pub struct ReplaySource<B: BufRead> {
    lines: Lines<B>,
    line_number: usize,
    skipped: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        debug!(path = %path.display(), "Opened pose replay");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<B: BufRead> ReplaySource<B> {
    pub fn from_reader(reader: B) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Lines that could not be parsed
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<B: BufRead> PoseSource for ReplaySource<B> {
    fn next_frame(&mut self) -> Option<CapturedFrame> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    warn!(line = self.line_number + 1, error = %e, "Replay read failed, stopping");
                    return None;
                }
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<RecordedFrame>(trimmed) {
                Ok(record) if is_valid_frame_size(record.width, record.height) => {
                    return Some(record.into());
                }
                Ok(record) => {
                    self.skipped += 1;
                    warn!(
                        line = self.line_number,
                        width = record.width,
                        height = record.height,
                        "Skipping replay line with unsupported frame size"
                    );
                }
                Err(e) => {
                    self.skipped += 1;
                    warn!(line = self.line_number, error = %e, "Skipping malformed replay line");
                }
            }
        }
    }
}
