//! Survey selection

use crate::config::SurveyFilterConfig;
use crate::domain::{ExportTargetId, Survey};
use std::collections::HashSet;

/// Selects the surveys a session exports
///
/// An inclusion list wins over an exclusion list; the `max_surveys` cap is
/// applied last. Matching is on the export-target id and the listing order is
/// kept.
#[derive(Debug, Clone, Default)]
pub struct SurveyFilter {
    include: Option<HashSet<ExportTargetId>>,
    exclude: Option<HashSet<ExportTargetId>>,
    max_surveys: Option<usize>,
}

impl SurveyFilter {
    /// Build the filter from the `[export.request]` section
    pub fn from_config(config: &SurveyFilterConfig) -> Self {
        Self {
            include: config
                .survey_ids
                .as_ref()
                .map(|ids| ids.iter().copied().collect()),
            exclude: config
                .exclude_survey_ids
                .as_ref()
                .map(|ids| ids.iter().copied().collect()),
            max_surveys: config.max_surveys,
        }
    }

    /// Apply the filter
    pub fn apply(&self, surveys: Vec<Survey>) -> Vec<Survey> {
        let selected = surveys.into_iter().filter(|survey| {
            let target = survey.platform_form_id;
            match (&self.include, &self.exclude) {
                (Some(include), _) => include.contains(&target),
                (None, Some(exclude)) => !exclude.contains(&target),
                (None, None) => true,
            }
        });

        match self.max_surveys {
            Some(max) => selected.take(max).collect(),
            None => selected.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn surveys() -> Vec<Survey> {
        (1..=5)
            .map(|i| Survey::new(i, format!("s{i}"), format!("S{i}"), ExportTargetId::new(i * 100)))
            .collect()
    }

    fn ids(values: &[i64]) -> Option<Vec<ExportTargetId>> {
        Some(values.iter().copied().map(ExportTargetId::new).collect())
    }

    fn targets(surveys: &[Survey]) -> Vec<i64> {
        surveys.iter().map(|s| s.platform_form_id.value()).collect()
    }

    #[test_case(None, None, None, &[100, 200, 300, 400, 500] ; "no filter")]
    #[test_case(ids(&[300, 100]), None, None, &[100, 300] ; "inclusion keeps listing order")]
    #[test_case(None, ids(&[200, 400]), None, &[100, 300, 500] ; "exclusion")]
    #[test_case(ids(&[100, 200]), ids(&[100]), None, &[100, 200] ; "inclusion wins over exclusion")]
    #[test_case(None, None, Some(2), &[100, 200] ; "cap")]
    #[test_case(None, ids(&[100]), Some(2), &[200, 300] ; "cap applies after exclusion")]
    #[test_case(ids(&[999]), None, None, &[] ; "nothing matches")]
    fn test_apply(
        survey_ids: Option<Vec<ExportTargetId>>,
        exclude_survey_ids: Option<Vec<ExportTargetId>>,
        max_surveys: Option<usize>,
        expected: &[i64],
    ) {
        let config = SurveyFilterConfig {
            survey_ids,
            exclude_survey_ids,
            max_surveys,
            ..SurveyFilterConfig::default()
        };

        let selected = SurveyFilter::from_config(&config).apply(surveys());
        assert_eq!(targets(&selected), expected);
    }
}
