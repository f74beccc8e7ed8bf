use log::{debug, error, info, warn};
use signal_engine::config_loader::{ConfigFormat, ConfigLoader};
use signal_engine::level::LevelConfig;
use std::env;
use std::path::PathBuf;

fn main() {
    // 로그 초기화
    env_logger::init();

    info!("레벨 설정 로더 시작");

    // 커맨드 라인 인수 파싱
    let args: Vec<String> = env::args().collect();
    debug!("커맨드 라인 인수: {:?}", args);

    let config_path = if args.len() >= 2 {
        debug!("사용자 지정 설정 파일 사용: {}", args[1]);
        PathBuf::from(&args[1])
    } else {
        debug!("기본 설정 파일 경로 사용");
        PathBuf::from("config").join("level.toml")
    };

    if !config_path.exists() {
        warn!("설정 파일이 존재하지 않습니다: {}", config_path.display());
        println!(
            "경고: 설정 파일이 존재하지 않습니다: {}",
            config_path.display()
        );
        println!("사용법: {} [설정_파일_경로(.toml|.json)]", args[0]);
        return;
    }

    info!("설정 파일: {}", config_path.display());
    println!("설정 파일: {}", config_path.display());

    match ConfigLoader::load_from_file::<LevelConfig>(&config_path, ConfigFormat::Auto) {
        Ok(config) => {
            info!("레벨 설정 로드 성공");
            println!("레벨 설정 로드 성공:");
            println!(
                "  클러스터 임계값: {:.2}% (동적: {})",
                config.cluster_threshold_percent,
                if config.dynamic_cluster_threshold.enabled {
                    "활성"
                } else {
                    "비활성"
                }
            );
            println!(
                "  터치: 최소 {}회, 포화 {}회",
                config.min_touches_required, config.min_touches_for_strong
            );
            println!(
                "  거리: 최대 {:.2}%, 근접 {:.2}%, 추세 정렬 배수 {:.1}x",
                config.max_distance_percent,
                config.very_close_distance_percent,
                config.trend_aligned_distance_multiplier
            );
            println!(
                "  신뢰도: 기본 {:.0}, 상한 {:.0}, 동률 정책 {:?}",
                config.base_confidence, config.max_confidence, config.tiebreak_preference
            );
            println!(
                "  소진: {}, 오더북 확인: {}, 시간 가중: {}",
                if config.level_exhaustion.enabled {
                    "활성"
                } else {
                    "비활성"
                },
                if config.orderbook_validation.enabled {
                    "활성"
                } else {
                    "비활성"
                },
                if config.time_weighted_strength.enabled {
                    "활성"
                } else {
                    "비활성"
                }
            );
        }
        Err(err) => {
            let error_msg = format!("레벨 설정 로드 실패: {}", err);
            error!("{}", error_msg);
            println!("{}", error_msg);

            // 에러 종류에 따라 추가 정보 제공
            if err.to_string().contains("파싱") {
                println!("해결 방법: 설정 파일 형식이 올바른지 확인하세요.");
            } else if err.to_string().contains("유효성 검사") {
                println!("해결 방법: 설정 값이 유효 범위 내에 있는지 확인하세요.");
            }
        }
    }

    info!("레벨 설정 로더 종료");
}
