//! 터미널 출력 포맷팅 유틸리티
//!
//! 셸 초기화 과정과 헤드리스 창 출력에 사용되는 터미널 출력 함수들을 제공합니다.
//! 박스 형태의 제목, 진행 단계 표시, 창/대화상자 렌더링 등을 시각적으로 표현합니다.

const CONTENT_WIDTH: usize = 50;

/// 박스 형태로 둘러싸인 제목을 출력합니다
///
/// 텍스트는 자동으로 중앙 정렬됩니다.
///
/// Output:
/// ```text
/// ╔══════════════════════════════════════════════════╗
/// ║                  System Started                  ║
/// ╚══════════════════════════════════════════════════╝
/// ```
pub fn print_boxed_title(title: &str) {
    println!("{}", boxed_title(title));
}

pub fn boxed_title(title: &str) -> String {
    let border = "═".repeat(CONTENT_WIDTH);
    format!("╔{}╗\n║{:^49}║\n╚{}╝", border, title, border)
}

/// 진행 단계 시작을 표시합니다
///
/// ```text
/// → Step 1: Registering services
/// ```
pub fn print_step_start(step: u8, description: &str) {
    println!("→ Step {}: {}", step, description);
}

/// 진행 단계 완료를 처리된 항목 수와 함께 표시합니다
///
/// ```text
/// ✓ Step 1: Services registered (5 items)
/// ```
pub fn print_step_complete(step: u8, description: &str, count: usize) {
    println!("✓ Step {}: {} ({} items)", step, description, count);
}

/// 서브 작업의 상태를 표시합니다
///
/// ```text
///    ├─ RootViewModel: singleton
///    ├─ ErrorViewModel: transient
/// ```
pub fn print_sub_task(name: &str, status: &str) {
    println!("   ├─ {}: {}", name, status);
}

/// 서비스 등록 요약을 출력합니다
pub fn print_final_summary(singletons: usize, transients: usize, views: usize) {
    println!();
    print_boxed_title("🎉 SHELL READY");
    println!("   📦 Singletons: {}", singletons);
    println!("   🔧 Transients: {}", transients);
    println!("   🪟 View bindings: {}", views);
    println!("   🚀 Total Registrations: {}", singletons + transients);
    println!();
}

/// 창 제목과 본문을 박스로 그립니다. 본문의 각 줄은 테두리 안쪽으로 들여쓰기 됩니다.
///
/// ```text
/// ┌─ Error ───────────────────────────────────────────┐
/// │ Test                                              │
/// └───────────────────────────────────────────────────┘
/// ```
pub fn render_window(title: &str, body: &str) -> String {
    let header_fill = CONTENT_WIDTH.saturating_sub(title.chars().count() + 2);
    let mut out = format!("┌─ {} {}┐\n", title, "─".repeat(header_fill));
    for line in body.lines() {
        let pad = CONTENT_WIDTH.saturating_sub(line.chars().count() + 1);
        out.push_str(&format!("│ {}{}│\n", line, " ".repeat(pad)));
    }
    out.push_str(&format!("└{}┘", "─".repeat(CONTENT_WIDTH + 1)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxed_title_has_three_lines() {
        let title = boxed_title("Ready");
        let lines: Vec<&str> = title.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Ready"));
        assert!(lines[0].starts_with('╔'));
    }

    #[test]
    fn test_render_window_frames_each_line() {
        let rendered = render_window("Error", "first\nsecond");
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("┌─ Error "));
        assert!(lines[1].starts_with("│ first"));
        assert!(lines[2].starts_with("│ second"));
        assert!(lines[3].starts_with('└'));
    }
}
