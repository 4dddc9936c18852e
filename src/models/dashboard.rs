use serde::Serialize;

/// A static item shown on the reception dashboard.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DashboardCard {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// The fixed cards returned by `/api/home`. Not derived from any data source.
pub const DASHBOARD_CARDS: [DashboardCard; 3] = [
    DashboardCard {
        title: "오늘의 방문 예정",
        description: "예약된 방문자 3명",
        icon: "👥",
    },
    DashboardCard {
        title: "확인 대기",
        description: "입장 승인 대기 1건",
        icon: "⏳",
    },
    DashboardCard {
        title: "공지사항",
        description: "새로운 보안 지침을 확인하세요.",
        icon: "📢",
    },
];
