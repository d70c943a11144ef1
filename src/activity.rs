use crate::models::{ActivityStatus, ActivityStatusResponse, BarChart};

/// Schools for one status, largest first. `None` when the backend has no
/// breakdown for that status.
pub fn breakdown(data: &ActivityStatusResponse, status: ActivityStatus) -> Option<BarChart> {
    data.counts_by_school
        .get(status.key())
        .map(BarChart::by_school)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response() -> ActivityStatusResponse {
        serde_json::from_value(json!({
            "status": "success",
            "counts": { "virkir": 3, "ad_detta": null },
            "countsBySchool": {
                "ad_detta": { "Hagaskóli": 1, "Melaskóli": 4, "Vesturbæjarskóli": 2 }
            }
        }))
        .unwrap()
    }

    #[test]
    fn breakdown_sorts_descending_relative_to_max() {
        let chart = breakdown(&response(), ActivityStatus::AdDetta).unwrap();
        let labels: Vec<&str> = chart.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Melaskóli", "Vesturbæjarskóli", "Hagaskóli"]);
        assert_eq!(chart.items[0].width, 100.0);
        assert_eq!(chart.items[1].width, 50.0);
        assert_eq!(chart.items[2].width, 25.0);
    }

    #[test]
    fn null_counts_read_as_zero() {
        let data = response();
        assert_eq!(data.counts.get(ActivityStatus::Virkir), 3);
        assert_eq!(data.counts.get(ActivityStatus::AdDetta), 0);
        assert_eq!(data.counts.get(ActivityStatus::Ovirkir), 0);
    }

    #[test]
    fn missing_status_has_no_breakdown() {
        assert!(breakdown(&response(), ActivityStatus::Virkir).is_none());
    }

    #[test]
    fn status_keys_round_trip_and_colours() {
        for status in ActivityStatus::ALL {
            assert_eq!(ActivityStatus::parse(status.key()), Some(status));
        }
        assert_eq!(ActivityStatus::AdDetta.color_var(), "--color-ad-detta");
        assert_eq!(ActivityStatus::parse("unknown"), None);
    }
}
