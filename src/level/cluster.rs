use crate::level::config::DynamicClusterThresholdConfig;
use crate::model::{Level, LevelKind, SwingPoint};

/// 스윙 포인트를 가격 근접도로 클러스터링하여 후보 레벨 생성
///
/// 가격 오름차순으로 정렬한 뒤 좌에서 우로 스윕하며, 진행 중인
/// 클러스터의 이동 평균과의 상대 거리가 `threshold_ratio` 이하인
/// 포인트를 같은 클러스터로 합칩니다. 초과하면 현재 클러스터를
/// 닫아 레벨로 내보내고 해당 포인트로 새 클러스터를 시작합니다.
///
/// 입력 순서는 결과에 영향을 주지 않으며 (정렬 선행), 마지막에
/// 홀로 남은 포인트도 1터치 클러스터로 닫힙니다. 터치 수 필터링은
/// 호출자의 몫입니다.
///
/// # Arguments
/// * `points` - 스윙 포인트 목록 (정렬 여부 무관)
/// * `kind` - 생성할 레벨 종류
/// * `threshold_ratio` - 근접 임계값 비율 (0.005 = 0.5%)
///
/// # Returns
/// * `Vec<Level>` - 가격 오름차순의 후보 레벨 목록 (빈 입력이면 빈 목록)
pub fn cluster_swing_points(
    points: &[SwingPoint],
    kind: LevelKind,
    threshold_ratio: f64,
) -> Vec<Level> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&SwingPoint> = points.iter().collect();
    sorted.sort_by(|a, b| {
        a.price
            .partial_cmp(&b.price)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut levels = Vec::new();
    let mut cluster: Vec<&SwingPoint> = vec![sorted[0]];
    let mut cluster_sum = sorted[0].price;

    for point in sorted.into_iter().skip(1) {
        let cluster_mean = cluster_sum / cluster.len() as f64;
        if (point.price - cluster_mean).abs() / cluster_mean <= threshold_ratio {
            cluster.push(point);
            cluster_sum += point.price;
        } else {
            levels.push(close_cluster(&cluster, cluster_sum, kind));
            cluster = vec![point];
            cluster_sum = point.price;
        }
    }
    levels.push(close_cluster(&cluster, cluster_sum, kind));

    levels
}

/// 진행 중인 클러스터를 레벨로 닫기
fn close_cluster(cluster: &[&SwingPoint], price_sum: f64, kind: LevelKind) -> Level {
    let mean = price_sum / cluster.len() as f64;
    let timestamps = cluster.iter().map(|p| p.timestamp).collect();
    Level::from_cluster(mean, kind, timestamps)
}

/// 유효 클러스터 임계값 계산
///
/// 변동성 적응이 활성화되고 ATR 비율이 주어지면
/// `max(정적 임계값, atr_percent × atr_multiplier / 100)`을 반환합니다.
/// 변동성이 클수록 더 공격적으로 묶되, 정적 하한보다 좁아지지는 않습니다.
pub fn effective_cluster_threshold(
    static_ratio: f64,
    atr_percent: Option<f64>,
    dynamic: &DynamicClusterThresholdConfig,
) -> f64 {
    match atr_percent {
        Some(atr) if dynamic.enabled => static_ratio.max(atr * dynamic.atr_multiplier / 100.0),
        _ => static_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SwingKind;
    use chrono::{DateTime, Utc};

    fn ts(minutes: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(minutes * 60, 0).unwrap()
    }

    fn lows(prices: &[f64]) -> Vec<SwingPoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| SwingPoint::new(p, ts(i as i64), SwingKind::Low))
            .collect()
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(cluster_swing_points(&[], LevelKind::Support, 0.005).is_empty());
    }

    #[test]
    fn test_close_prices_form_one_cluster() {
        let points = lows(&[100.0, 100.1, 100.2]);
        let levels = cluster_swing_points(&points, LevelKind::Support, 0.005);

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].touches, 3);
        assert!((levels[0].price - 100.1).abs() < 1e-9);
        assert_eq!(levels[0].last_touch, ts(2));
        assert_eq!(levels[0].kind, LevelKind::Support);
    }

    #[test]
    fn test_distant_prices_split_clusters() {
        let points = lows(&[100.0, 100.1, 105.0, 105.2]);
        let levels = cluster_swing_points(&points, LevelKind::Support, 0.005);

        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].touches, 2);
        assert_eq!(levels[1].touches, 2);
    }

    #[test]
    fn test_trailing_single_point_closes_as_cluster() {
        let points = lows(&[100.0, 100.1, 120.0]);
        let levels = cluster_swing_points(&points, LevelKind::Support, 0.005);

        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].touches, 1);
        assert_eq!(levels[1].price, 120.0);
    }

    #[test]
    fn test_membership_is_order_independent() {
        let mut shuffled = lows(&[105.0, 100.1, 100.0, 105.2, 99.9]);
        let levels_a = cluster_swing_points(&shuffled, LevelKind::Support, 0.005);
        shuffled.reverse();
        let levels_b = cluster_swing_points(&shuffled, LevelKind::Support, 0.005);

        let touches_a: Vec<usize> = levels_a.iter().map(|l| l.touches).collect();
        let touches_b: Vec<usize> = levels_b.iter().map(|l| l.touches).collect();
        assert_eq!(touches_a, touches_b);
        for (a, b) in levels_a.iter().zip(levels_b.iter()) {
            assert!((a.price - b.price).abs() < 1e-9);
        }
    }

    #[test]
    fn test_effective_threshold_uses_atr_floor() {
        let dynamic = DynamicClusterThresholdConfig {
            enabled: true,
            atr_multiplier: 0.5,
        };

        // ATR 2% × 0.5 / 100 = 0.01 > 정적 0.005
        let widened = effective_cluster_threshold(0.005, Some(2.0), &dynamic);
        assert!((widened - 0.01).abs() < 1e-12);

        // 정적 하한 아래로는 내려가지 않음
        let floored = effective_cluster_threshold(0.005, Some(0.2), &dynamic);
        assert!((floored - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_effective_threshold_disabled_or_missing_atr() {
        let dynamic = DynamicClusterThresholdConfig {
            enabled: false,
            atr_multiplier: 0.5,
        };
        assert_eq!(
            effective_cluster_threshold(0.005, Some(5.0), &dynamic),
            0.005
        );

        let enabled = DynamicClusterThresholdConfig {
            enabled: true,
            atr_multiplier: 0.5,
        };
        assert_eq!(effective_cluster_threshold(0.005, None, &enabled), 0.005);
    }
}
