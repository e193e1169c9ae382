//! Base codes: the closed set of spell behaviors.
//!
//! Every effect code starts with a 3-letter base selecting one handler.
//! Buff and charge codes are composed from two axes, a stat focus and a
//! target group:
//!
//! ```text
//! B{A,G,F}{L,R,G,F,A}   buff   (F = attack and guard)
//! C{A,G,H}{L,R,G,F,A}   charge (H = attack and guard)
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::DIE_FACES;

/// Which stat a buff or charge affects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatFocus {
    Attack,
    Guard,
    Both,
}

impl StatFocus {
    const ALL: [StatFocus; 3] = [StatFocus::Attack, StatFocus::Guard, StatFocus::Both];

    fn label(self) -> &'static str {
        match self {
            StatFocus::Attack => "Attack",
            StatFocus::Guard => "Guard",
            StatFocus::Both => "Attack/Guard",
        }
    }
}

/// Which allies a buff or charge reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetGroup {
    Left,
    Right,
    Greater,
    Fewer,
    AllOther,
}

impl TargetGroup {
    const ALL: [TargetGroup; 5] = [
        TargetGroup::Left,
        TargetGroup::Right,
        TargetGroup::Greater,
        TargetGroup::Fewer,
        TargetGroup::AllOther,
    ];

    fn letter(self) -> u8 {
        match self {
            TargetGroup::Left => b'L',
            TargetGroup::Right => b'R',
            TargetGroup::Greater => b'G',
            TargetGroup::Fewer => b'F',
            TargetGroup::AllOther => b'A',
        }
    }

    fn from_letter(letter: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.letter() == letter)
    }

    fn label(self) -> &'static str {
        match self {
            TargetGroup::Left => "Left",
            TargetGroup::Right => "Right",
            TargetGroup::Greater => "Greater",
            TargetGroup::Fewer => "Fewer",
            TargetGroup::AllOther => "All Other",
        }
    }
}

/// Parameter-assembly family of a base code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectFamily {
    /// `ATT`, `PAT`, `GUA`, `HEA`: one amount.
    Amount,
    /// `STU`, `FRZ`, `EMP`: one duration.
    Duration,
    /// `CON`: marked slots plus damage.
    Confuse,
    /// `B**`: buff amount, duration, target tier, class.
    Buff,
    /// `C**` except `CON`: charge amount, target tier, class.
    Charge,
    /// `ID1`..`ID6`: no parameters.
    DiceTrigger,
}

/// One input slot of a base code, in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name.
    pub key: &'static str,
    /// Token letter. `None` for the leading unlettered value.
    pub token: Option<char>,
}

const fn first(key: &'static str) -> ParamSpec {
    ParamSpec { key, token: None }
}

const fn lettered(key: &'static str, token: char) -> ParamSpec {
    ParamSpec { key, token: Some(token) }
}

const AMOUNT_PARAMS: [ParamSpec; 1] = [first("amount")];
const DURATION_PARAMS: [ParamSpec; 1] = [first("duration")];
const CONFUSE_PARAMS: [ParamSpec; 2] = [first("marked_slots"), lettered("damage_amount", 'D')];
const BUFF_PARAMS: [ParamSpec; 4] = [
    first("buff_amount"),
    lettered("duration", 'D'),
    lettered("target_tier", 'T'),
    lettered("buff_class", 'C'),
];
const CHARGE_PARAMS: [ParamSpec; 3] = [
    first("charge_amount"),
    lettered("target_tier", 'T'),
    lettered("charge_class", 'C'),
];

/// A recognized base code. Each variant maps to exactly one handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseCode {
    Attack,
    PrepAttack,
    Guard,
    Heal,
    Stun,
    Freeze,
    Empower,
    Confuse,
    Buff(StatFocus, TargetGroup),
    Charge(StatFocus, TargetGroup),
    /// Dice-result trigger, face in `1..=6`.
    DiceTrigger(u8),
}

impl BaseCode {
    /// Look up a base code. `None` means no handler exists.
    ///
    /// ```
    /// use spell_battle::effects::{BaseCode, StatFocus, TargetGroup};
    ///
    /// assert_eq!(BaseCode::from_code("ATT"), Some(BaseCode::Attack));
    /// assert_eq!(
    ///     BaseCode::from_code("CHA"),
    ///     Some(BaseCode::Charge(StatFocus::Both, TargetGroup::AllOther)),
    /// );
    /// assert_eq!(BaseCode::from_code("XYZ"), None);
    /// ```
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let bytes: [u8; 3] = code.as_bytes().try_into().ok()?;

        let fixed = match &bytes {
            b"ATT" => Some(BaseCode::Attack),
            b"PAT" => Some(BaseCode::PrepAttack),
            b"GUA" => Some(BaseCode::Guard),
            b"HEA" => Some(BaseCode::Heal),
            b"STU" => Some(BaseCode::Stun),
            b"FRZ" => Some(BaseCode::Freeze),
            b"EMP" => Some(BaseCode::Empower),
            b"CON" => Some(BaseCode::Confuse),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        match bytes {
            [b'B', focus, group] => {
                let focus = match focus {
                    b'A' => StatFocus::Attack,
                    b'G' => StatFocus::Guard,
                    b'F' => StatFocus::Both,
                    _ => return None,
                };
                TargetGroup::from_letter(group).map(|group| BaseCode::Buff(focus, group))
            }
            [b'C', focus, group] => {
                let focus = match focus {
                    b'A' => StatFocus::Attack,
                    b'G' => StatFocus::Guard,
                    b'H' => StatFocus::Both,
                    _ => return None,
                };
                TargetGroup::from_letter(group).map(|group| BaseCode::Charge(focus, group))
            }
            [b'I', b'D', face @ b'1'..=b'6'] => Some(BaseCode::DiceTrigger(face - b'0')),
            _ => None,
        }
    }

    /// Dice trigger for a rolled face. `None` outside `1..=6`.
    #[must_use]
    pub fn dice(face: u8) -> Option<Self> {
        (1..=DIE_FACES).contains(&face).then_some(BaseCode::DiceTrigger(face))
    }

    /// The 3-letter wire code.
    #[must_use]
    pub fn code_bytes(self) -> [u8; 3] {
        match self {
            BaseCode::Attack => *b"ATT",
            BaseCode::PrepAttack => *b"PAT",
            BaseCode::Guard => *b"GUA",
            BaseCode::Heal => *b"HEA",
            BaseCode::Stun => *b"STU",
            BaseCode::Freeze => *b"FRZ",
            BaseCode::Empower => *b"EMP",
            BaseCode::Confuse => *b"CON",
            BaseCode::Buff(focus, group) => {
                let focus = match focus {
                    StatFocus::Attack => b'A',
                    StatFocus::Guard => b'G',
                    StatFocus::Both => b'F',
                };
                [b'B', focus, group.letter()]
            }
            BaseCode::Charge(focus, group) => {
                let focus = match focus {
                    StatFocus::Attack => b'A',
                    StatFocus::Guard => b'G',
                    StatFocus::Both => b'H',
                };
                [b'C', focus, group.letter()]
            }
            BaseCode::DiceTrigger(face) => [b'I', b'D', b'0' + face.clamp(1, DIE_FACES)],
        }
    }

    /// The parameter-assembly family.
    #[must_use]
    pub fn family(self) -> EffectFamily {
        match self {
            BaseCode::Attack | BaseCode::PrepAttack | BaseCode::Guard | BaseCode::Heal => {
                EffectFamily::Amount
            }
            BaseCode::Stun | BaseCode::Freeze | BaseCode::Empower => EffectFamily::Duration,
            BaseCode::Confuse => EffectFamily::Confuse,
            BaseCode::Buff(..) => EffectFamily::Buff,
            BaseCode::Charge(..) => EffectFamily::Charge,
            BaseCode::DiceTrigger(_) => EffectFamily::DiceTrigger,
        }
    }

    /// Ordered input slots for assembling this code.
    #[must_use]
    pub fn parameters(self) -> &'static [ParamSpec] {
        match self.family() {
            EffectFamily::Amount => &AMOUNT_PARAMS,
            EffectFamily::Duration => &DURATION_PARAMS,
            EffectFamily::Confuse => &CONFUSE_PARAMS,
            EffectFamily::Buff => &BUFF_PARAMS,
            EffectFamily::Charge => &CHARGE_PARAMS,
            EffectFamily::DiceTrigger => &[],
        }
    }

    /// Human-readable name, e.g. "Charge Attack/Guard (Left)".
    #[must_use]
    pub fn label(self) -> String {
        match self {
            BaseCode::Attack => "Attack".to_string(),
            BaseCode::PrepAttack => "Prep Attack".to_string(),
            BaseCode::Guard => "Guard".to_string(),
            BaseCode::Heal => "Heal".to_string(),
            BaseCode::Stun => "Stun".to_string(),
            BaseCode::Freeze => "Freeze".to_string(),
            BaseCode::Empower => "Empower".to_string(),
            BaseCode::Confuse => "Confuse".to_string(),
            BaseCode::Buff(focus, group) => format!("Buff {} ({})", focus.label(), group.label()),
            BaseCode::Charge(focus, group) => {
                format!("Charge {} ({})", focus.label(), group.label())
            }
            BaseCode::DiceTrigger(face) => format!("Dice Trigger {}", face),
        }
    }

    /// Every recognized base code, in catalog order.
    pub fn all() -> Vec<BaseCode> {
        let mut codes = vec![
            BaseCode::Attack,
            BaseCode::PrepAttack,
            BaseCode::Guard,
        ];
        for group in TargetGroup::ALL {
            for focus in StatFocus::ALL {
                codes.push(BaseCode::Buff(focus, group));
            }
        }
        codes.extend([
            BaseCode::Stun,
            BaseCode::Freeze,
            BaseCode::Confuse,
            BaseCode::Heal,
            BaseCode::Empower,
        ]);
        for group in TargetGroup::ALL {
            for focus in StatFocus::ALL {
                codes.push(BaseCode::Charge(focus, group));
            }
        }
        codes.extend((1..=DIE_FACES).map(BaseCode::DiceTrigger));
        codes
    }
}

impl std::fmt::Display for BaseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.code_bytes() {
            write!(f, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

impl std::str::FromStr for BaseCode {
    type Err = UnknownBaseCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BaseCode::from_code(s).ok_or_else(|| UnknownBaseCode(s.to_string()))
    }
}

/// A base code with no handler.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("no spell handler for base code {0:?}")]
pub struct UnknownBaseCode(pub String);

impl Serialize for BaseCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BaseCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}
