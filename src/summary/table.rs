//! Summary rows and tab-separated rendering.

use std::io;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::annotation::ComponentKind;
use crate::candidate::{FormulaResult, FormulaResultId};
use crate::compound::CompoundId;
use crate::error::SummaryError;
use crate::formula::MolecularFormula;
use crate::ranking::Scored;
use crate::score::{FormulaScoring, ScoreKind};

const NA: &str = "N/A";

const TREE_COLUMNS: [&str; 6] = [
    "numExplainedPeaks",
    "explainedIntensity",
    "medianMassErrorFragmentPeaks(ppm)",
    "medianAbsoluteMassErrorFragmentPeaks(ppm)",
    "massErrorPrecursor(ppm)",
    "lipidClass",
];

const PROJECT_COLUMNS: [&str; 4] = ["ionMass", "retentionTimeInSeconds", "id", "featureId"];

/// Renders `value` with exactly `scale` decimals, rounding half away from zero.
///
/// Rounding works on the shortest decimal representation of `value`, so
/// `0.123455` becomes `0.12346`. Non-finite values, and values too large for
/// a [`Decimal`], render as `NaN`.
#[must_use]
pub fn round_half_up(value: f64, scale: u32) -> String {
    if !value.is_finite() {
        return "NaN".to_string();
    }
    let Ok(exact) = Decimal::from_str(&value.to_string()) else {
        return "NaN".to_string();
    };
    let mut rounded = exact.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.rescale(scale);
    rounded.to_string()
}

/// One summary row, fully formatted except for the score columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    id: FormulaResultId,
    rank: u32,
    position: usize,
    scoring: FormulaScoring,
    ion: String,
    tree_num_vertices: String,
    tree_explained_intensity: String,
    median_mass_deviation: String,
    median_abs_mass_deviation: String,
    mass_error_precursor: String,
    lipid_class: String,
    ion_mass: String,
    retention_time_seconds: String,
    directory_name: String,
    feature_id: String,
}

impl ResultEntry {
    /// Captures `result` at `rank`; `position` is its index in the ranked list.
    ///
    /// Fails when the candidate carries no score set.
    pub fn new(
        result: &FormulaResult,
        compound: &CompoundId,
        rank: u32,
        position: usize,
    ) -> Result<Self, SummaryError> {
        let scoring = result
            .scoring()
            .cloned()
            .ok_or_else(|| SummaryError::MissingComponent {
                candidate: result.id().to_string(),
                kind: ComponentKind::FormulaScoring,
            })?;

        let mut entry = Self {
            id: result.id().clone(),
            rank,
            position,
            scoring,
            ion: result
                .id()
                .ion_type()
                .map_or_else(|| NA.to_string(), ToString::to_string),
            tree_num_vertices: NA.to_string(),
            tree_explained_intensity: NA.to_string(),
            median_mass_deviation: NA.to_string(),
            median_abs_mass_deviation: NA.to_string(),
            mass_error_precursor: NA.to_string(),
            lipid_class: result.lipid_species().map(ToString::to_string).unwrap_or_default(),
            ion_mass: round_half_up(compound.ion_mass().unwrap_or(f64::NAN), 5),
            retention_time_seconds: compound.retention_time_seconds().unwrap_or(f64::NAN).to_string(),
            directory_name: compound.directory_name().to_string(),
            feature_id: compound.feature_id().unwrap_or(NA).to_string(),
        };

        if let Some(tree) = result.tree() {
            entry.tree_num_vertices = tree.num_vertices.to_string();
            entry.tree_explained_intensity = tree.explained_intensity.to_string();
            entry.median_mass_deviation = tree.median_mass_deviation_ppm.to_string();
            entry.median_abs_mass_deviation = tree.median_abs_mass_deviation_ppm.to_string();
            entry.mass_error_precursor = compound
                .ion_mass()
                .and_then(|mz| tree.precursor_mass_error_ppm(mz))
                .map_or_else(|| NA.to_string(), |ppm| ppm.to_string());
        }
        Ok(entry)
    }

    /// The candidate this row describes.
    #[must_use]
    pub const fn id(&self) -> &FormulaResultId {
        &self.id
    }

    /// Tie-aware rank within the compound.
    #[must_use]
    pub const fn rank(&self) -> u32 {
        self.rank
    }

    /// Index in the compound's ranked list.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The candidate's score set.
    #[must_use]
    pub const fn formula_scoring(&self) -> &FormulaScoring {
        &self.scoring
    }

    /// Directory name of the owning compound.
    #[must_use]
    pub fn directory_name(&self) -> &str {
        &self.directory_name
    }

    fn row(&self, score_columns: &[ScoreKind], project_columns: bool) -> Vec<String> {
        let mut row = Vec::with_capacity(4 + score_columns.len() + TREE_COLUMNS.len() + PROJECT_COLUMNS.len());
        row.push(self.rank.to_string());
        row.push(self.id.molecular_formula().to_string());
        row.push(self.ion.clone());
        row.push(self.id.precursor_formula().to_string());
        row.extend(score_columns.iter().map(|kind| self.scoring.get(*kind).to_string()));
        row.extend([
            self.tree_num_vertices.clone(),
            self.tree_explained_intensity.clone(),
            self.median_mass_deviation.clone(),
            self.median_abs_mass_deviation.clone(),
            self.mass_error_precursor.clone(),
            self.lipid_class.clone(),
        ]);
        if project_columns {
            row.extend([
                self.ion_mass.clone(),
                self.retention_time_seconds.clone(),
                self.directory_name.clone(),
                self.feature_id.clone(),
            ]);
        }
        row
    }
}

impl Scored for ResultEntry {
    fn scoring(&self) -> Option<&FormulaScoring> {
        Some(&self.scoring)
    }

    fn precursor_formula(&self) -> &MolecularFormula {
        self.id.precursor_formula()
    }
}

/// A rendered table: one header and rows of equal width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryTable {
    /// Column names.
    pub header: Vec<String>,
    /// Formatted cells, one vector per row.
    pub rows: Vec<Vec<String>>,
}

impl SummaryTable {
    /// Builds a table from entries in output order.
    ///
    /// `project_columns` appends the compound metadata columns used by the
    /// project-wide files.
    #[must_use]
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a ResultEntry>,
        score_columns: &[ScoreKind],
        project_columns: bool,
    ) -> Self {
        let mut header: Vec<String> = ["formulaRank", "molecularFormula", "adduct", "precursorFormula"]
            .iter()
            .map(ToString::to_string)
            .collect();
        header.extend(score_columns.iter().map(|kind| kind.name().to_string()));
        header.extend(TREE_COLUMNS.iter().map(ToString::to_string));
        if project_columns {
            header.extend(PROJECT_COLUMNS.iter().map(ToString::to_string));
        }

        let rows = entries
            .into_iter()
            .map(|e| e.row(score_columns, project_columns))
            .collect();
        Self { header, rows }
    }

    /// Index of the column named `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Number of rows, header excluded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the header and every row as tab-separated records.
    ///
    /// Fields holding a tab, a quote or a line break are quoted.
    pub fn write_to<W: io::Write>(&self, w: W) -> Result<(), SummaryError> {
        let mut out = WriterBuilder::new().delimiter(b'\t').from_writer(w);
        if !self.header.is_empty() {
            out.write_record(&self.header)?;
        }
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Tab-separated text, one line per record.
    pub fn to_tsv(&self) -> Result<String, SummaryError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Parses text produced by [`SummaryTable::to_tsv`].
    ///
    /// The first record is the header; rows must match its width.
    pub fn from_tsv(text: &str) -> Result<Self, SummaryError> {
        let fields = |record: StringRecord| record.iter().map(ToString::to_string).collect::<Vec<_>>();
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_reader(text.as_bytes());
        let mut records = reader.records();
        let header = match records.next() {
            Some(record) => fields(record?),
            None => Vec::new(),
        };
        let rows = records
            .map(|record| record.map(fields))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { header, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::IonType;
    use crate::tree::{FragmentationTree, LipidSpecies};

    fn compound() -> CompoundId {
        CompoundId::new("3_sample", 3)
            .unwrap()
            .with_ion_mass(181.070_665)
            .with_retention_time(62.5)
    }

    fn result(with_scoring: bool) -> FormulaResult {
        let f = MolecularFormula::parse("C6H12O6").unwrap();
        let mut r = FormulaResult::new(FormulaResultId::new(
            compound(),
            f.clone(),
            f,
            Some(IonType::new("[M+H]+")),
        ));
        if with_scoring {
            r.annotations.set(FormulaScoring::new().with(ScoreKind::Sirius, 10.5));
        }
        r
    }

    #[test]
    fn round_half_up_cases() {
        assert_eq!(round_half_up(181.070_665, 5), "181.07067");
        assert_eq!(round_half_up(0.123_455, 5), "0.12346");
        assert_eq!(round_half_up(1.0, 5), "1.00000");
        assert_eq!(round_half_up(9.999_995, 5), "10.00000");
        assert_eq!(round_half_up(0.000_005, 5), "0.00001");
        assert_eq!(round_half_up(-2.5, 0), "-3");
        assert_eq!(round_half_up(-0.000_001, 5), "0.00000");
        assert_eq!(round_half_up(f64::NAN, 5), "NaN");
        assert_eq!(round_half_up(f64::MAX, 5), "NaN");
    }

    #[test]
    fn entry_without_scoring_is_rejected() {
        let err = ResultEntry::new(&result(false), &compound(), 1, 0).unwrap_err();
        assert!(matches!(
            err,
            SummaryError::MissingComponent {
                kind: ComponentKind::FormulaScoring,
                ..
            }
        ));
    }

    #[test]
    fn entry_without_tree_renders_na() {
        let entry = ResultEntry::new(&result(true), &compound(), 1, 0).unwrap();
        let table = SummaryTable::from_entries([&entry], &[ScoreKind::Sirius], true);
        let row = &table.rows[0];
        assert_eq!(row[table.column("numExplainedPeaks").unwrap()], "N/A");
        assert_eq!(row[table.column("lipidClass").unwrap()], "");
        assert_eq!(row[table.column("ionMass").unwrap()], "181.07067");
        assert_eq!(row[table.column("retentionTimeInSeconds").unwrap()], "62.5");
        assert_eq!(row[table.column("featureId").unwrap()], "N/A");
        assert_eq!(row[table.column("SiriusScore").unwrap()], "10.5");
    }

    #[test]
    fn entry_with_tree_and_lipid() {
        let mut r = result(true);
        r.annotations.set(FragmentationTree {
            num_vertices: 7,
            explained_intensity: 0.75,
            median_mass_deviation_ppm: 1.25,
            median_abs_mass_deviation_ppm: 2.0,
            root_ion_mass: 181.070_665,
        });
        r.annotations.set(LipidSpecies::new("PC 34:1"));
        let entry = ResultEntry::new(&r, &compound(), 2, 0).unwrap();
        let table = SummaryTable::from_entries([&entry], &[], false);
        assert_eq!(table.header.len(), 10);
        let row = &table.rows[0];
        assert_eq!(row[0], "2");
        assert_eq!(row[2], "[M+H]+");
        assert_eq!(row[table.column("numExplainedPeaks").unwrap()], "7");
        assert_eq!(row[table.column("massErrorPrecursor(ppm)").unwrap()], "0");
        assert_eq!(row[table.column("lipidClass").unwrap()], "PC 34:1");
    }

    #[test]
    fn tsv_parses_back() {
        let entry = ResultEntry::new(&result(true), &compound(), 1, 0).unwrap();
        let table = SummaryTable::from_entries([&entry], &[ScoreKind::Sirius, ScoreKind::Zodiac], true);
        let text = table.to_tsv().unwrap();
        assert!(text.starts_with("formulaRank\tmolecularFormula\tadduct\tprecursorFormula\tSiriusScore\tZodiacScore\t"));
        assert_eq!(SummaryTable::from_tsv(&text).unwrap(), table);
    }

    #[test]
    fn fields_with_separators_survive_a_round_trip() {
        let id = compound().with_feature_id("feature\t7");
        let mut r = result(true);
        r.annotations.set(LipidSpecies::new("PC \"34:1\"\nsn-2"));
        let entry = ResultEntry::new(&r, &id, 1, 0).unwrap();
        let table = SummaryTable::from_entries([&entry], &[ScoreKind::Sirius], true);

        let parsed = SummaryTable::from_tsv(&table.to_tsv().unwrap()).unwrap();
        assert_eq!(parsed, table);
        assert_eq!(parsed.rows[0].len(), parsed.header.len());
        assert_eq!(parsed.rows[0][parsed.column("featureId").unwrap()], "feature\t7");
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(SummaryTable::from_tsv("a\tb\n1\n").is_err());
    }
}
