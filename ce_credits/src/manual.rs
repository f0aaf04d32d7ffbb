/*!

This is the long-form manual for `ce_credits` and `cecredits`.

## Overview

Continuing-education credits are earned per session. Two independent sources say
who attended what:
* the signature sheets, recorded by hand in the participant registry
  (`sessions_signed`),
* the evaluation surveys, one response per participant and presentation.

`cecredits` cross-checks the two sources, computes the credits of every
participant and reports the anomalies that need a human decision.

## Registries

The session registry is a JSON object keyed by session:

```json
{
  "ses-001": { "length": 90, "presenters": ["Lee", "Patel"] },
  "2": { "duration": 60, "presenters": ["Kim"] }
}
```

Bare integer keys are turned into `ses-NNN`. The presenter names are the keys used
to match the surveys: they must be unique inside a session.

The participant registry is a JSON object keyed by participant:

```json
{
  "pid-001": { "sessions_signed": [1, 2] },
  "pid-002": { "sessions_attended": ["morning"] },
  "3": {}
}
```

Bare integer keys are turned into `pid-NNN`, session numbers into `ses-NNN`.
Missing fields are empty: partial participation is expected.

## Statuses

Every (presentation, participant) pair gets one status:

| status                 | score | grid |
|------------------------|-------|------|
| signed and evaluated   | 3     | `#`  |
| signed, no evaluation  | 2     | `+`  |
| evaluated, no signature| 1     | `!`  |
| neither                | -     | `.`  |

A session is credited when at least one of its presentations is signed (score 2
or more). It is worth `duration / minutesPerCredit` credits (60 minutes by default).

## Survey sources

* `csv` Comma Separated Values, with a header row.
* `xlsx` Excel spreadsheet, first worksheet unless `excelWorksheetName` is given.

The `participantColumn` holds the participant number (or e-mail), the
`presentationColumn` the presentation. If the survey exports numeric codes, the
`presentationLabels` map turns them into display names such as
`"Lee, Dreams and memory"`. The presenter key is the text before the first comma.

Rows can be filtered with a `completeness` list, for example:

```json
"completeness": [
  { "column": "Finished", "values": ["1"] },
  { "column": "Progress", "values": ["100"] }
]
```

## Failures

A survey that names an unknown presenter or participant stops the run: the data
should be corrected at the source and exported again. Duplicate submissions,
sheets without surveys, surveys without sheets and signatures for sessions
missing from the session registry are only reported.

*/
