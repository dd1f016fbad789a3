//! Bracket-token scanning and molecule segmentation over the echoed input.
//!
//! CRYOFF keywords appear as bracket tokens (`[ MOL ]`, `[BON]`, ...) with
//! free-form spacing. A token spans from the first `[` of a line to the last
//! `]` of the same line; its letters are matched against the closed keyword
//! vocabulary by three-character prefix, then four (`CDIH` is the only
//! four-character code).

use super::{OffError, OffParseErrorKind, line_number};
use phf::{Map, phf_map};

/// The CRYOFF keyword vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Opt,
    Key,
    Mol,
    Ato,
    Bon,
    Ang,
    Bd3,
    Dih,
    Cdih,
    Exc,
    Fud,
    Cou,
    Thc,
    Glj,
    Buc,
    Dbu,
    Str,
    Exp,
    Pow,
    Pex,
    Dpo,
    Srd,
    Eqv,
    Cha,
}

static KEYWORDS: Map<&'static str, Keyword> = phf_map! {
    "OPT" => Keyword::Opt,
    "KEY" => Keyword::Key,
    "MOL" => Keyword::Mol,
    "ATO" => Keyword::Ato,
    "BON" => Keyword::Bon,
    "ANG" => Keyword::Ang,
    "BD3" => Keyword::Bd3,
    "DIH" => Keyword::Dih,
    "CDIH" => Keyword::Cdih,
    "EXC" => Keyword::Exc,
    "FUD" => Keyword::Fud,
    "COU" => Keyword::Cou,
    "THC" => Keyword::Thc,
    "GLJ" => Keyword::Glj,
    "BUC" => Keyword::Buc,
    "DBU" => Keyword::Dbu,
    "STR" => Keyword::Str,
    "EXP" => Keyword::Exp,
    "POW" => Keyword::Pow,
    "PEX" => Keyword::Pex,
    "DPO" => Keyword::Dpo,
    "SRD" => Keyword::Srd,
    "EQV" => Keyword::Eqv,
    "CHA" => Keyword::Cha,
};

impl Keyword {
    /// Matches a token's alphanumeric content against the vocabulary,
    /// testing the three-character prefix before the four-character one.
    pub fn lookup(token: &str) -> Option<Keyword> {
        let letters: Vec<char> = token.chars().filter(char::is_ascii_alphanumeric).collect();
        let three: String = letters.iter().take(3).collect();
        if let Some(keyword) = KEYWORDS.get(three.as_str()) {
            return Some(*keyword);
        }
        let four: String = letters.iter().take(4).collect();
        KEYWORDS.get(four.as_str()).copied()
    }

    /// Keywords that structure the per-molecule bonded description.
    pub fn is_bonded(self) -> bool {
        matches!(
            self,
            Keyword::Mol
                | Keyword::Ato
                | Keyword::Bon
                | Keyword::Ang
                | Keyword::Bd3
                | Keyword::Dih
                | Keyword::Cdih
                | Keyword::Exc
        )
    }

    /// Keywords naming nonbonded functional forms. These may appear in the
    /// echoed input, but the nonbonded model is built from the fitted
    /// inter-potential lines, so hits of this class have no consumer.
    pub fn is_nonbonded(self) -> bool {
        !self.is_bonded() && !matches!(self, Keyword::Opt | Keyword::Key)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Opt => "OPT",
            Keyword::Key => "KEY",
            Keyword::Mol => "MOL",
            Keyword::Ato => "ATO",
            Keyword::Bon => "BON",
            Keyword::Ang => "ANG",
            Keyword::Bd3 => "BD3",
            Keyword::Dih => "DIH",
            Keyword::Cdih => "CDIH",
            Keyword::Exc => "EXC",
            Keyword::Fud => "FUD",
            Keyword::Cou => "COU",
            Keyword::Thc => "THC",
            Keyword::Glj => "GLJ",
            Keyword::Buc => "BUC",
            Keyword::Dbu => "DBU",
            Keyword::Str => "STR",
            Keyword::Exp => "EXP",
            Keyword::Pow => "POW",
            Keyword::Pex => "PEX",
            Keyword::Dpo => "DPO",
            Keyword::Srd => "SRD",
            Keyword::Eqv => "EQV",
            Keyword::Cha => "CHA",
        }
    }
}

/// One recognized bracket token and its byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordHit {
    pub keyword: Keyword,
    /// Byte offset of the opening `[`.
    pub start: usize,
    /// Byte offset just past the closing `]`.
    pub end: usize,
}

/// Locates the bracket token of one line: first `[` to the last `]` after
/// it. Returns the byte range within the line.
fn bracket_token(line: &str) -> Option<(usize, usize)> {
    let open = line.find('[')?;
    let close = line.rfind(']')?;
    if close > open { Some((open, close + 1)) } else { None }
}

/// Byte offset of the first line-complete bracket token in `text`.
fn next_token_start(text: &str) -> Option<usize> {
    let mut offset = 0usize;
    for line in text.split('\n') {
        if let Some((open, _)) = bracket_token(line) {
            return Some(offset + open);
        }
        offset += line.len() + 1;
    }
    None
}

/// Scans a section for recognized keyword tokens, in file order.
pub fn scan(section: &str) -> Vec<KeywordHit> {
    let mut hits = Vec::new();
    let mut offset = 0usize;
    for line in section.split('\n') {
        if let Some((open, close)) = bracket_token(line) {
            if let Some(keyword) = Keyword::lookup(&line[open..close]) {
                hits.push(KeywordHit {
                    keyword,
                    start: offset + open,
                    end: offset + close,
                });
            }
        }
        offset += line.len() + 1;
    }
    hits
}

/// Splits hits into the bonded and nonbonded classes, dropping `OPT`/`KEY`.
pub fn classify(hits: &[KeywordHit]) -> (Vec<KeywordHit>, Vec<KeywordHit>) {
    let bonded = hits.iter().copied().filter(|h| h.keyword.is_bonded()).collect();
    let nonbonded = hits
        .iter()
        .copied()
        .filter(|h| h.keyword.is_nonbonded())
        .collect();
    (bonded, nonbonded)
}

/// One bonded section of a molecule: the keyword plus the byte range of its
/// content (from the end of the token to the start of the next one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SectionSpan {
    pub keyword: Keyword,
    pub start: usize,
    pub end: usize,
}

/// The token layout of one molecule within the echoed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MoleculeSpan {
    pub name: String,
    pub sections: Vec<SectionSpan>,
}

/// Groups the bonded hits into per-molecule spans.
///
/// Each molecule owns the tokens from its `[MOL]` up to the next `[MOL]`.
/// The final molecule ends at the first bracket token after the last bonded
/// token, or at the end of the section when none follows.
pub(crate) fn segment_molecules(
    bonded: &[KeywordHit],
    ff_input: &str,
) -> Result<Vec<MoleculeSpan>, OffError> {
    let Some(first) = bonded.first() else {
        return Ok(Vec::new());
    };
    if first.keyword != Keyword::Mol {
        return Err(OffError::Parse {
            line: line_number(ff_input, first.start),
            kind: OffParseErrorKind::KeywordBeforeMolecule {
                keyword: first.keyword.as_str(),
            },
        });
    }

    let last = bonded.last().unwrap_or(first);
    let trailing_end = next_token_start(&ff_input[last.end..])
        .map(|open| last.end + open)
        .unwrap_or(ff_input.len());

    let mut molecules: Vec<MoleculeSpan> = Vec::new();
    for (i, hit) in bonded.iter().enumerate() {
        // Content runs to the start of the following token; the last token
        // of the whole list runs to the trailing boundary.
        let content_end = bonded
            .get(i + 1)
            .map(|next| next.start)
            .unwrap_or(trailing_end);

        if hit.keyword == Keyword::Mol {
            molecules.push(MoleculeSpan {
                name: molecule_name(ff_input, hit)?,
                sections: Vec::new(),
            });
        } else if let Some(current) = molecules.last_mut() {
            current.sections.push(SectionSpan {
                keyword: hit.keyword,
                start: hit.end,
                end: content_end,
            });
        }
    }
    Ok(molecules)
}

/// The first whitespace-delimited word after a `[MOL]` token, on its line.
fn molecule_name(ff_input: &str, hit: &KeywordHit) -> Result<String, OffError> {
    let rest = &ff_input[hit.end..];
    let line = rest.split('\n').next().unwrap_or("");
    line.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or(OffError::Parse {
            line: line_number(ff_input, hit.start),
            kind: OffParseErrorKind::MissingMoleculeName,
        })
}
