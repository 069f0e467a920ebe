//! Shared fixture data for integration tests.
#![allow(dead_code)]

use sales_call_insights::loader::{read_evaluations, read_recordings};
use sales_call_insights::Datasets;

pub const DISCOVER: &str = "Discover the \"Why\"";

/// Five calls by three reps. r5 has no evaluations; r2 has zero
/// conversation time; r5 has a negative duration.
pub const RECORDINGS_CSV: &str = "\
recordingid,userId,dateCreated,durationInMilliseconds,conversationTime,repSpeakingTime,repWordCount,repQuestionsCount,customerQuestionsCount,outcome
r1,alice,2025-08-06T10:00:00Z,600000,500000,250000,900,10,4,won
r2,alice,2025-08-10T09:00:00Z,300000,0,100,500,4,2,lost
r3,bob,2025-09-20T15:00:00Z,480000,400000,300000,1200,2,8,lost
r4,bob,2025-09-25T11:00:00Z,420000,400000,200000,800,8,3,won
r5,carol,2025-08-12T08:00:00Z,-5,100000,50000,300,3,3,lost
";

/// Seven evaluations. r9 has no recording; r2's metadata is not JSON;
/// r4's Closing score is not numeric.
pub const EVALUATIONS_CSV: &str = r#"recordingid,userId,recordingdate,skillName,score,scoringMetadata
r1,alice,2025-08-06T10:05:00Z,Rapport,5,"{""impact"":""Built trust quickly"",""recommendation"":""Continue mirroring the customer's language"",""thinkingWithCitation"":{""citations"":[{""quote"":""That makes sense""},{""quote"":""Tell me more about that""}]}}"
r1,alice,2025-08-06T10:05:00Z,"Discover the ""Why""",4,"{""impact"":""Uncovered the budget driver"",""recommendation"":""Deepen the why questions""}"
r2,alice,2025-08-10T09:05:00Z,"Discover the ""Why""",2,not json
r3,bob,2025-09-20T15:05:00Z,"Discover the ""Why""",1,"{""impact"":""Customer disengaged"",""recommendation"":""Practice open questions and focus on pain"",""thinkingWithCitation"":{""citations"":[{""quote"":""So what's your budget?""}]}}"
r4,bob,2025-09-25T11:05:00Z,"Discover the ""Why""",3,"{""impact"":""Found one pain point"",""recommendation"":""Keep summarizing, but improve follow-up""}"
r4,bob,2025-09-25T11:05:00Z,Closing,n/a,
r9,dave,2025-09-01T00:00:00Z,Rapport,4,
"#;

pub fn datasets() -> Datasets {
    let (recordings, recording_tally) = read_recordings(RECORDINGS_CSV.as_bytes()).unwrap();
    let (evaluations, evaluation_tally) = read_evaluations(EVALUATIONS_CSV.as_bytes()).unwrap();
    let mut data = Datasets::new(recordings, evaluations);
    data.quality.recordings = recording_tally;
    data.quality.evaluations = evaluation_tally;
    data
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
