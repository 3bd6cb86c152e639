//! Chart data orchestration: filter, shape, window

use crate::aggregate::aggregate;
use crate::chart::{ChartConfig, ChartPlan, DataStrategy};
use crate::filter::filter_rows;
use crate::pivot::pivot;
use crate::sort::sort_rows;
use crate::value::{Dataset, Row};
use serde::Serialize;

/// Render-ready chart data
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    /// Rows in display order
    pub rows: Vec<Row>,
    /// Series (category) names, one visual trace each
    pub categories: Vec<String>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ChartPlan {
    /// Run the plan over a dataset's rows. The input is never modified.
    pub fn execute(&self, rows: &[Row]) -> Series {
        let filtered = if self.filters.is_empty() {
            rows.to_vec()
        } else {
            filter_rows(rows, &self.filters)
        };

        let (shaped, categories) = match &self.strategy {
            DataStrategy::Pivoted {
                y_key,
                category_key,
                transform,
                sort_order,
            } => {
                let pivoted = pivot(
                    &filtered,
                    &self.x_key,
                    y_key,
                    category_key,
                    *transform,
                    sort_order,
                );
                (pivoted.rows, pivoted.categories)
            }
            DataStrategy::Aggregated { function } => (
                aggregate(&filtered, &self.x_key, &self.y_keys, *function),
                self.y_keys.clone(),
            ),
            DataStrategy::Plain { sort_order } => (
                sort_rows(&filtered, &self.x_key, sort_order),
                self.y_keys.clone(),
            ),
            DataStrategy::Donut { aggregate: function } => {
                let rows = match function {
                    Some(function) => aggregate(&filtered, &self.x_key, &self.y_keys, *function),
                    None => filtered,
                };
                return Series {
                    rows,
                    categories: self.y_keys.clone(),
                };
            }
        };

        Series {
            rows: self.window.apply(shaped),
            categories,
        }
    }
}

/// Build the series for `chart` over `dataset`
pub fn build(chart: &ChartConfig, dataset: &Dataset) -> Series {
    chart.plan().execute(&dataset.rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn chart(json: &str) -> ChartConfig {
        serde_json::from_str(json).unwrap()
    }

    fn xs(series: &Series, key: &str) -> Vec<String> {
        series.rows.iter().map(|r| r[key].as_text()).collect()
    }

    #[test]
    fn test_aggregate_scenario() {
        let data = csv::parse("date,count\n2024-01,5\n2024-02,3\n2024-01,2");
        let c = chart(r#"{"id":"c","title":"t","type":"bar","xKey":"date","yKey":"count","aggregate":true}"#);

        let series = build(&c, &data);
        assert_eq!(series.categories, vec!["count"]);
        assert_eq!(xs(&series, "date"), vec!["2024-01", "2024-02"]);
        assert_eq!(series.rows[0]["count"], Value::Number(7.0));
        assert_eq!(series.rows[1]["count"], Value::Number(3.0));
    }

    #[test]
    fn test_pivot_path_with_filter_and_window() {
        let data = csv::parse(
            "week,device,count,env\n\
             2024-03,ios,1,prod\n\
             2024-01,ios,2,prod\n\
             2024-01,web,3,test\n\
             2024-02,android,4,prod\n\
             2024-04,web,5,prod",
        );
        let c = chart(
            r#"{"id":"c","title":"t","type":"area","xKey":"week","yKey":"count","categoryKey":"device",
                "filter":{"field":"env","value":"test","exclude":true},"offset":1,"limit":2}"#,
        );

        let series = build(&c, &data);
        assert_eq!(series.categories, vec!["android", "ios", "web"]);
        assert_eq!(xs(&series, "week"), vec!["2024-02", "2024-03"]);
    }

    #[test]
    fn test_plain_path_sorts_time_axis() {
        let data = csv::parse("month,n\n2024-02,1\n2024-01,2");
        let c = chart(r#"{"id":"c","title":"t","type":"line","xKey":"month","yKey":["n"]}"#);

        let series = build(&c, &data);
        assert_eq!(xs(&series, "month"), vec!["2024-01", "2024-02"]);
        assert_eq!(series.categories, vec!["n"]);
    }

    #[test]
    fn test_plain_path_keeps_order_for_categorical_axis() {
        let data = csv::parse("device,n\nweb,1\nandroid,2\nios,3");
        let c = chart(r#"{"id":"c","title":"t","type":"bar","xKey":"device","yKey":"n","limit":2}"#);

        let series = build(&c, &data);
        assert_eq!(xs(&series, "device"), vec!["web", "android"]);
    }

    #[test]
    fn test_donut_ignores_category_and_window() {
        let data = csv::parse("device,n,kind\nweb,1,a\nios,2,b\nweb,4,a\nandroid,1,b");
        let c = chart(
            r#"{"id":"c","title":"t","type":"donut","xKey":"device","yKey":"n","categoryKey":"kind",
                "aggregate":true,"limit":1}"#,
        );

        let series = build(&c, &data);
        assert_eq!(series.categories, vec!["n"]);
        assert_eq!(xs(&series, "device"), vec!["web", "ios", "android"]);
        assert_eq!(series.rows[0]["n"], Value::Number(5.0));
    }

    #[test]
    fn test_donut_without_aggregate_returns_filtered_rows() {
        let data = csv::parse("device,n\nweb,1\nios,2");
        let c = chart(
            r#"{"id":"c","title":"t","type":"donut","xKey":"device","yKey":"n",
                "filter":{"field":"device","value":"ios"}}"#,
        );

        let series = build(&c, &data);
        assert_eq!(series.rows, vec![data.rows[1].clone()]);
    }

    #[test]
    fn test_unsupported_kind_still_builds() {
        let data = csv::parse("x,y\na,1");
        let c = chart(r#"{"id":"c","title":"t","type":"radar","xKey":"x","yKey":"y"}"#);
        assert_eq!(build(&c, &data).len(), 1);
    }

    #[test]
    fn test_build_does_not_mutate_dataset() {
        let data = csv::parse("date,count\n2024-02,1\n2024-01,2");
        let before = data.clone();
        let c = chart(r#"{"id":"c","title":"t","type":"bar","xKey":"date","yKey":"count"}"#);
        let _ = build(&c, &data);
        assert_eq!(data, before);
    }
}
