/// Form catalog: the closed set of player forms, their fixed cycle order,
/// and the ability each one grants.
///
/// ## Abilities
/// ┌───────────┬──────────────────────────────────────┐
/// │ Form      │ Ability                               │
/// ├───────────┼──────────────────────────────────────┤
/// │ Chameleon │ none (baseline, always available)     │
/// │ Frog      │ long-jump over one water cell         │
/// │ Gorilla   │ push a boulder one cell               │
/// │ Mole      │ walk through dirt                     │
/// └───────────┴──────────────────────────────────────┘

use std::collections::BTreeSet;

use strum::{Display, EnumIter};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Display, EnumIter)]
pub enum Form {
    Chameleon,
    Frog,
    Gorilla,
    Mole,
}

/// Fixed order walked by the shapeshift cycle.
pub const CYCLE: [Form; 4] = [Form::Chameleon, Form::Frog, Form::Gorilla, Form::Mole];

impl Form {
    pub fn jumps_water(self) -> bool {
        matches!(self, Form::Frog)
    }

    pub fn pushes_boulders(self) -> bool {
        matches!(self, Form::Gorilla)
    }

    pub fn digs(self) -> bool {
        matches!(self, Form::Mole)
    }

    /// Position of this form in `CYCLE`.
    pub fn cycle_index(self) -> usize {
        match self {
            Form::Chameleon => 0,
            Form::Frog => 1,
            Form::Gorilla => 2,
            Form::Mole => 3,
        }
    }

    /// The form a token glyph unlocks. Chameleon has no token.
    pub fn from_token_glyph(ch: char) -> Option<Form> {
        match ch {
            'F' => Some(Form::Frog),
            'G' => Some(Form::Gorilla),
            'M' => Some(Form::Mole),
            _ => None,
        }
    }

    /// Walk `CYCLE` starting just after `self`, wrapping, and return the
    /// first form that is available and differs from `self`.
    pub fn next_available(self, available: &FormSet) -> Option<Form> {
        let start = self.cycle_index();
        (1..=CYCLE.len())
            .map(|step| CYCLE[(start + step) % CYCLE.len()])
            .find(|&f| f != self && available.contains(f))
    }
}

/// Forms unlocked in the current level. Only grows within a level.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FormSet {
    forms: BTreeSet<Form>,
}

impl FormSet {
    /// The set every level starts with: just the chameleon.
    pub fn baseline() -> Self {
        let mut forms = BTreeSet::new();
        forms.insert(Form::Chameleon);
        FormSet { forms }
    }

    /// Add a form. Returns true if it was not already present.
    pub fn insert(&mut self, form: Form) -> bool {
        self.forms.insert(form)
    }

    pub fn contains(&self, form: Form) -> bool {
        self.forms.contains(&form)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Iterate in cycle order.
    pub fn iter(&self) -> impl Iterator<Item = Form> + '_ {
        self.forms.iter().copied()
    }
}

impl Default for FormSet {
    fn default() -> Self {
        FormSet::baseline()
    }
}
