//! 代码库哈希校验
//!
//! 按固定规则遍历目录，计算每个文件的 SHA-256，再把 `"{相对路径}:{文件哈希}"`
//! 按路径排序后依次送入总哈希。相同的文件集合总是得到相同的总哈希。

// 标准库导入
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::process::Command;

// 第三方crate导入
use anyhow::{Context, Result};
use chrono::Local;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// 详细报告文件名
pub const REPORT_FILE_NAME: &str = "codebase_hash_report.json";

/// 基线哈希文件名
pub const BASELINE_FILE_NAME: &str = ".codebase_hash";

/// 读取文件的块大小
const CHUNK_SIZE: usize = 4096;

/// 参与哈希的目录和顶层文件
pub const INCLUDE_DIRS: &[&str] = &[
    "cmd",
    "pkg",
    "internal",
    "src",
    "tests",
    "scripts",
    "docs",
    "config",
    "web",
    "static",
    "templates",
    "go.mod",
    "go.sum",
    "Cargo.toml",
    "Makefile",
    "Dockerfile",
    "docker-compose.yml",
    ".github",
    "requirements.txt",
    "package.json",
];

/// 排除的文件模式（匹配任意一级路径）
pub const EXCLUDE_PATTERNS: &[&str] = &[
    "*.log",
    "*.tmp",
    "*.bak",
    "*.swp",
    "*.swo",
    "*~",
    ".DS_Store",
    "Thumbs.db",
    "*.pid",
    "*.lock",
    ".#*",
    "#*#",
    "*.orig",
    "*.rej",
    ".git",
    ".svn",
    "node_modules",
    "__pycache__",
    ".pytest_cache",
    ".coverage",
    "coverage.xml",
    "*.pyc",
    "*.pyo",
    "*.pyd",
    ".env",
    ".env.*",
    "dist",
    "build",
    "target",
    "vendor",
    ".terraform",
    "*.tfstate",
    "*.tfstate.*",
    ".tox",
    ".venv",
    "venv",
    "env",
    ".idea",
    ".vscode",
    "*.sublime-project",
    "*.sublime-workspace",
    REPORT_FILE_NAME,
    BASELINE_FILE_NAME,
];

/// 即使命中排除规则也要包含的文件
pub const FORCE_INCLUDE: &[&str] = &[".gitignore", ".gitattributes", "go.mod", "go.sum"];

/// 哈希计算报告
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashReport {
    pub algorithm: String,
    pub base_directory: String,
    pub file_hashes: BTreeMap<String, String>,
    pub files_count: usize,
    pub timestamp: String,
    pub total_hash: String,
}

/// 一致性校验报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    pub current_hash: String,
    pub previous_hash: Option<String>,
    /// 没有基线时为 None
    pub hash_match: Option<bool>,
    pub git_status: Option<String>,
    pub timestamp: String,
    pub base_directory: String,
}

/// 简单通配符模式（`*` 和 `?`）
#[derive(Debug)]
struct GlobPattern {
    regex: Regex,
}

impl GlobPattern {
    fn new(pattern: &str) -> Result<Self> {
        let mut expr = String::from("^");
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');
        let regex = Regex::new(&expr).with_context(|| format!("无效的排除模式: {}", pattern))?;
        Ok(Self { regex })
    }

    fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// 文件筛选规则
#[derive(Debug)]
pub struct FileFilter {
    excludes: Vec<GlobPattern>,
}

impl FileFilter {
    pub fn new() -> Result<Self> {
        let excludes = EXCLUDE_PATTERNS
            .iter()
            .map(|pattern| GlobPattern::new(pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { excludes })
    }

    /// 判断相对路径是否参与哈希
    ///
    /// 依次检查：强制包含 → 排除模式 → 隐藏的顶层项 → 顶层文件或位于包含目录下。
    pub fn should_include(&self, rel_path: &Path) -> bool {
        let parts: Vec<String> = rel_path
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let Some(file_name) = parts.last() else {
            return false;
        };

        if FORCE_INCLUDE.contains(&file_name.as_str()) {
            return true;
        }

        if parts
            .iter()
            .any(|part| self.excludes.iter().any(|glob| glob.matches(part)))
        {
            return false;
        }

        if parts[0].starts_with('.') {
            return false;
        }

        parts.len() == 1 || parts.iter().any(|part| INCLUDE_DIRS.contains(&part.as_str()))
    }
}

/// 计算单个文件的 SHA-256（十六进制小写）
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// 相对路径统一使用 `/` 分隔
fn relative_key(rel_path: &Path) -> String {
    rel_path
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

/// 收集参与哈希的文件，按相对路径排序
pub fn collect_files(base: &Path, filter: &FileFilter) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(base).into_iter().filter_entry(|e| !is_hidden_dir(e)) {
        let entry = entry.with_context(|| format!("遍历目录失败: {}", base.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel_path = entry
            .path()
            .strip_prefix(base)
            .with_context(|| format!("无法计算相对路径: {}", entry.path().display()))?;
        if filter.should_include(rel_path) {
            files.push((relative_key(rel_path), entry.path().to_path_buf()));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// 计算总哈希，返回报告（不写文件）
pub fn compute_hash_report(base_dir: &Path) -> Result<HashReport> {
    let base = base_dir
        .canonicalize()
        .with_context(|| format!("目录不存在: {}", base_dir.display()))?;
    info!("🔍 计算代码库哈希: {}", base.display());

    let filter = FileFilter::new()?;
    let files = collect_files(&base, &filter)?;
    info!("📁 找到 {} 个文件", files.len());

    let mut file_hashes = BTreeMap::new();
    let mut total = Sha256::new();

    for (rel_path, path) in files {
        match hash_file(&path) {
            Ok(file_hash) => {
                debug!("{} {}", &file_hash[..16], rel_path);
                total.update(format!("{}:{}", rel_path, file_hash).as_bytes());
                file_hashes.insert(rel_path, file_hash);
            }
            Err(e) => warn!("⚠️  无法读取 {}: {}", path.display(), e),
        }
    }

    Ok(HashReport {
        algorithm: "SHA256".to_string(),
        base_directory: base.display().to_string(),
        files_count: file_hashes.len(),
        file_hashes,
        timestamp: Local::now().to_rfc3339(),
        total_hash: format!("{:x}", total.finalize()),
    })
}

/// 计算总哈希并写入详细报告
pub fn calculate_codebase_hash(base_dir: &Path) -> Result<HashReport> {
    let report = compute_hash_report(base_dir)?;

    let report_path = Path::new(&report.base_directory).join(REPORT_FILE_NAME);
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&report_path, json)
        .with_context(|| format!("写入报告失败: {}", report_path.display()))?;

    info!("🔐 代码库哈希: {}...", &report.total_hash[..16]);
    info!("💾 报告已保存: {}", report_path.display());
    Ok(report)
}

/// 读取基线哈希
pub fn read_baseline(base_dir: &Path) -> Result<Option<String>> {
    let path = base_dir.join(BASELINE_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("读取基线失败: {}", path.display()))?;
    Ok(Some(content.trim().to_string()))
}

/// 查询 git 工作区状态，非 git 仓库或 git 不可用时返回 None
fn git_status(base_dir: &Path) -> Option<String> {
    if !base_dir.join(".git").exists() {
        return None;
    }
    let output = Command::new("git")
        .args(["status", "--porcelain"])
        .current_dir(base_dir)
        .output()
        .ok()?;
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// 校验当前哈希与基线是否一致
pub fn verify_codebase(base_dir: &Path) -> Result<VerifyReport> {
    let report = calculate_codebase_hash(base_dir)?;
    let base = PathBuf::from(&report.base_directory);
    let previous_hash = read_baseline(&base)?;

    Ok(VerifyReport {
        hash_match: previous_hash
            .as_deref()
            .map(|previous| previous == report.total_hash),
        previous_hash,
        git_status: git_status(&base),
        timestamp: Local::now().to_rfc3339(),
        base_directory: report.base_directory,
        current_hash: report.total_hash,
    })
}

/// 把当前哈希保存为基线
pub fn update_baseline(base_dir: &Path) -> Result<String> {
    let report = calculate_codebase_hash(base_dir)?;
    let path = Path::new(&report.base_directory).join(BASELINE_FILE_NAME);
    std::fs::write(&path, &report.total_hash)
        .with_context(|| format!("写入基线失败: {}", path.display()))?;
    Ok(report.total_hash)
}
