use std::path::PathBuf;

use revision::Revision;

use crate::{
    decode::decode,
    grammar::{branches_line, date_author_state, revision_line, symbol_line},
    types::{working_file_component, DeltaInfo, FileLog, RcsInfo},
    Error,
};

const FILE_DELIMITER_WIDTH: usize = 77;
const DELTA_DELIMITER_WIDTH: usize = 28;

fn is_file_delimiter(line: &str) -> bool {
    line.len() == FILE_DELIMITER_WIDTH && line.chars().all(|c| c == '=')
}

fn is_delta_delimiter(line: &str) -> bool {
    line.len() == DELTA_DELIMITER_WIDTH && line.chars().all(|c| c == '-')
}

/// Parses the full output of `cvs log` / `rlog` into one [`FileLog`] per
/// file, in the order the server reported them.
pub fn parse(input: &[u8]) -> Result<Vec<FileLog>, Error> {
    let text = decode(input)?;
    let lines: Vec<&str> = text.lines().collect();

    let mut i = 0;
    while i < lines.len() && is_file_delimiter(lines[i]) {
        i += 1;
    }

    let mut files = Vec::new();
    while i < lines.len() {
        let (file_log, next) = parse_file(&lines, i)?;
        files.push(file_log);
        i = next;

        while i < lines.len() && is_file_delimiter(lines[i]) {
            i += 1;
        }
    }

    Ok(files)
}

/// Parses a single file's header and deltas starting at `lines[start]`,
/// returning the parsed [`FileLog`] and the index of the line after it (the
/// next file delimiter, or `lines.len()`).
fn parse_file(lines: &[&str], start: usize) -> Result<(FileLog, usize), Error> {
    let mut i = start;

    let mut rcs_path = None;
    let mut working_file = None;
    let mut head = None;
    let mut default_branch = None;
    let mut tags = Vec::new();
    let mut keyword_mode = None;
    let mut description = String::new();

    while i < lines.len() && !is_delta_delimiter(lines[i]) && !is_file_delimiter(lines[i]) {
        let line = lines[i];

        if let Some(value) = line.strip_prefix("RCS file:") {
            rcs_path = Some(PathBuf::from(value.trim()));
            i += 1;
        } else if let Some(value) = line.strip_prefix("Working file:") {
            working_file = Some(working_file_component(value).ok_or_else(|| {
                Error::LogFormat(format!("invalid working file name: {}", value.trim()))
            })?);
            i += 1;
        } else if let Some(value) = line.strip_prefix("head:") {
            let value = value.trim();
            head = if value.is_empty() {
                None
            } else {
                Some(parse_revision(value)?)
            };
            i += 1;
        } else if let Some(value) = line.strip_prefix("branch:") {
            let value = value.trim();
            default_branch = if value.is_empty() {
                None
            } else {
                Some(parse_revision(value)?)
            };
            i += 1;
        } else if line.trim_start() == "symbolic names:" {
            i += 1;
            while i < lines.len() && lines[i].starts_with(char::is_whitespace) {
                let (_, (name, revision)) = symbol_line(lines[i])
                    .map_err(|e| Error::LogFormat(format!("bad symbolic name line: {}", e)))?;
                tags.push((name.to_string(), parse_revision(revision)?));
                i += 1;
            }
        } else if let Some(value) = line.strip_prefix("keyword substitution:") {
            let value = value.trim();
            keyword_mode = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
            i += 1;
        } else if line.trim_start() == "description:" {
            i += 1;
            let mut body = Vec::new();
            while i < lines.len() && !is_delta_delimiter(lines[i]) && !is_file_delimiter(lines[i])
            {
                body.push(lines[i]);
                i += 1;
            }
            description = body.join("\n");
        } else {
            // Lines we intentionally don't model (`locks:`, `access list:`,
            // `total revisions: N; selected revisions: N`, individual lock
            // entries) are simply skipped.
            i += 1;
        }
    }

    let rcs_path =
        rcs_path.ok_or_else(|| Error::LogFormat("missing RCS file: header".to_string()))?;
    let working_file = working_file
        .ok_or_else(|| Error::LogFormat("missing Working file: header".to_string()))?;

    let info = RcsInfo {
        rcs_path,
        working_file,
        head,
        default_branch,
        tags,
        keyword_mode,
        description,
    };

    let mut deltas = Vec::new();
    while i < lines.len() && is_delta_delimiter(lines[i]) {
        let (delta, next) = parse_delta(lines, i + 1)?;
        deltas.push(delta);
        i = next;
    }

    Ok((FileLog { info, deltas }, i))
}

/// Parses a single delta starting at `lines[start]` (the `revision ...`
/// line), returning it and the index of the line after its log body.
fn parse_delta(lines: &[&str], start: usize) -> Result<(DeltaInfo, usize), Error> {
    if start >= lines.len() {
        return Err(Error::LogFormat("truncated delta".to_string()));
    }

    let (_, revision_str) = revision_line(lines[start])
        .map_err(|e| Error::LogFormat(format!("bad revision line: {}", e)))?;
    let revision = parse_revision(revision_str)?;

    let mut i = start + 1;
    if i >= lines.len() {
        return Err(Error::LogFormat(format!(
            "revision {} has no date/author/state line",
            revision
        )));
    }

    let (_, (date, author, state)) = date_author_state(lines[i])
        .map_err(|e| Error::LogFormat(format!("bad date/author/state line: {}", e)))?;
    let date = date.to_string();
    let author = author.to_string();
    let state = state.to_string();
    i += 1;

    let mut branches = Vec::new();
    if i < lines.len() {
        if let Ok((_, branch_strs)) = branches_line(lines[i]) {
            for b in branch_strs {
                branches.push(parse_revision(b)?);
            }
            i += 1;
        }
    }

    let mut body = Vec::new();
    while i < lines.len() && !is_delta_delimiter(lines[i]) && !is_file_delimiter(lines[i]) {
        body.push(lines[i]);
        i += 1;
    }
    // cvs log pads the log message with a trailing blank line before the
    // next delimiter; trim exactly one, mirroring what was added.
    if matches!(body.last(), Some(&"")) {
        body.pop();
    }

    Ok((
        DeltaInfo {
            revision,
            date,
            author,
            state,
            branches,
            log: body.join("\n"),
        },
        i,
    ))
}

fn parse_revision(s: &str) -> Result<Revision, Error> {
    s.parse().map_err(Error::Revision)
}
