// Column layout of the decision variables.
// Variables live in one flat vector, family after family, each family in
// row-major order of its indices with the scenario varying fastest.

use crate::data::Dimensions;

/// The decision-variable families of the assignment model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableFamily {
    /// `assign[h][j][s]`
    Assign,
    /// `equip[h][e][s]`
    Equip,
    /// `duration[h][s]`
    Duration,
    /// `collab[h][i][j][s]`
    Collab,
    /// `util[h][e][s]`
    Util,
    /// `recip[h][s]`, lower envelope of `1 / duration[h][s]`
    Recip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    dims: Dimensions,
    assign: usize,
    equip: usize,
    duration: usize,
    collab: usize,
    util: usize,
    recip: usize,
    total: usize,
}

impl VariableLayout {
    pub fn new(dims: Dimensions) -> Self {
        let Dimensions {
            num_activities: h,
            num_agents: j,
            num_equipment: e,
            num_scenarios: s,
        } = dims;

        let assign = 0;
        let equip = assign + h * j * s;
        let duration = equip + h * e * s;
        let collab = duration + h * s;
        let util = collab + h * j * j * s;
        let recip = util + h * e * s;
        let total = recip + h * s;

        Self {
            dims,
            assign,
            equip,
            duration,
            collab,
            util,
            recip,
            total,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn num_variables(&self) -> usize {
        self.total
    }

    pub fn assign(&self, h: usize, j: usize, s: usize) -> usize {
        let d = &self.dims;
        self.assign + (h * d.num_agents + j) * d.num_scenarios + s
    }

    pub fn equip(&self, h: usize, e: usize, s: usize) -> usize {
        let d = &self.dims;
        self.equip + (h * d.num_equipment + e) * d.num_scenarios + s
    }

    pub fn duration(&self, h: usize, s: usize) -> usize {
        self.duration + h * self.dims.num_scenarios + s
    }

    pub fn collab(&self, h: usize, i: usize, j: usize, s: usize) -> usize {
        let d = &self.dims;
        self.collab + ((h * d.num_agents + i) * d.num_agents + j) * d.num_scenarios + s
    }

    pub fn util(&self, h: usize, e: usize, s: usize) -> usize {
        let d = &self.dims;
        self.util + (h * d.num_equipment + e) * d.num_scenarios + s
    }

    pub fn recip(&self, h: usize, s: usize) -> usize {
        self.recip + h * self.dims.num_scenarios + s
    }

    /// Which family a column belongs to
    pub fn family_of(&self, column: usize) -> Option<VariableFamily> {
        match column {
            c if c >= self.total => None,
            c if c >= self.recip => Some(VariableFamily::Recip),
            c if c >= self.util => Some(VariableFamily::Util),
            c if c >= self.collab => Some(VariableFamily::Collab),
            c if c >= self.duration => Some(VariableFamily::Duration),
            c if c >= self.equip => Some(VariableFamily::Equip),
            _ => Some(VariableFamily::Assign),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_are_dense_and_disjoint() {
        let layout = VariableLayout::new(Dimensions::new(2, 3, 2, 2));
        let d = layout.dimensions();
        let mut seen = vec![false; layout.num_variables()];
        let mut mark = |c: usize| {
            assert!(!seen[c], "column {} assigned twice", c);
            seen[c] = true;
        };

        for h in 0..d.num_activities {
            for s in 0..d.num_scenarios {
                mark(layout.duration(h, s));
                mark(layout.recip(h, s));
                for j in 0..d.num_agents {
                    mark(layout.assign(h, j, s));
                    for i in 0..d.num_agents {
                        mark(layout.collab(h, i, j, s));
                    }
                }
                for e in 0..d.num_equipment {
                    mark(layout.equip(h, e, s));
                    mark(layout.util(h, e, s));
                }
            }
        }
        assert!(seen.iter().all(|&b| b));
    }

    #[test]
    fn test_family_of() {
        let layout = VariableLayout::new(Dimensions::new(2, 2, 1, 1));
        assert_eq!(layout.family_of(layout.assign(1, 1, 0)), Some(VariableFamily::Assign));
        assert_eq!(layout.family_of(layout.collab(0, 1, 0, 0)), Some(VariableFamily::Collab));
        assert_eq!(layout.family_of(layout.recip(1, 0)), Some(VariableFamily::Recip));
        assert_eq!(layout.family_of(layout.num_variables()), None);
    }
}
