// 标准库导入
use std::time::Duration;

// 本地模块导入
use crate::walker::WalkStats;

/// 单次运行的性能统计
#[derive(Debug, Default, Clone)]
pub struct PerformanceStats {
    pub config_time: Duration,
    pub translator_init_time: Duration,
    pub file_read_time: Duration,
    pub parse_time: Duration,
    pub translation_time: Duration,
    pub file_write_time: Duration,
    pub input_size: usize,
    pub output_size: usize,
    pub elements: usize,
    pub units_found: usize,
    pub walk: WalkStats,
}

impl PerformanceStats {
    /// 平均每个翻译请求的耗时（不含缓存命中）
    pub fn average_request_time(&self) -> Option<Duration> {
        let requests = self.walk.translated + self.walk.failed;
        (requests > 0).then(|| self.translation_time / requests as u32)
    }
}

/// 打印性能统计
pub fn print_performance_stats(stats: &PerformanceStats, total_duration: Duration) {
    println!("\n📊 性能统计报告:");
    println!("═══════════════════════════════════════");

    // 时间分解
    println!("⏱️  时间分解:");
    println!("   配置加载: {}", format_duration(stats.config_time));
    println!(
        "   翻译器初始化: {}",
        format_duration(stats.translator_init_time)
    );
    println!("   文件读取: {}", format_duration(stats.file_read_time));
    println!("   XML解析: {}", format_duration(stats.parse_time));
    println!("   翻译执行: {}", format_duration(stats.translation_time));
    println!("   文件写入: {}", format_duration(stats.file_write_time));
    println!("   总耗时: {}", format_duration(total_duration));

    // 文件统计
    println!("\n📏 文件统计:");
    println!(
        "   输入大小: {} 字节 ({:.1} KB)",
        stats.input_size,
        stats.input_size as f64 / 1024.0
    );
    println!(
        "   输出大小: {} 字节 ({:.1} KB)",
        stats.output_size,
        stats.output_size as f64 / 1024.0
    );
    if stats.input_size > 0 {
        println!(
            "   大小变化: {:.1}%",
            (stats.output_size as f64 / stats.input_size as f64 - 1.0) * 100.0
        );
    }
    println!("   元素数量: {} 个", stats.elements);

    // 翻译统计
    println!("\n🔤 翻译统计:");
    println!("   待翻译片段: {} 项", stats.units_found);
    println!("   提交片段: {} 项", stats.walk.attempted);
    println!("   翻译成功: {} 项", stats.walk.translated);
    println!("   翻译失败: {} 项", stats.walk.failed);
    println!("   成功率: {:.1}%", stats.walk.success_rate());
    if let Some(average) = stats.average_request_time() {
        println!("   平均请求耗时: {}", format_duration(average));
    }

    // 缓存统计
    if stats.walk.cached > 0 {
        let cache_hit_rate = stats.walk.cached as f64 / stats.walk.attempted as f64;
        println!("\n💾 缓存统计:");
        println!("   缓存命中: {} 次", stats.walk.cached);
        println!("   命中率: {:.1}%", cache_hit_rate * 100.0);
    }

    // 性能指标
    let seconds = total_duration.as_secs_f64();
    if seconds > 0.0 {
        println!("\n🚀 性能指标:");
        println!(
            "   处理速度: {:.1} KB/s",
            stats.input_size as f64 / 1024.0 / seconds
        );
        println!(
            "   片段速度: {:.2} 项/s",
            stats.walk.attempted as f64 / seconds
        );
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if duration.as_secs() < 60 {
        format!("{:.3}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}
