//! Built-in catalog of categories, questions and trophies.
//!
//! Loading is get-or-create: existing rows are left untouched, so running the
//! loader twice only reports creations the first time.

use chrono::{DateTime, Utc};
use quiz_core::model::{
    Category, CategoryError, CategoryId, CategoryKind, Difficulty, LocalizedText, QuestionDraft,
    QuestionError, QuestionId, RequirementType, Trophy, TrophyError,
};
use thiserror::Error;

use crate::repository::{Storage, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Trophy(#[from] TrophyError),
}

/// How many rows a load actually created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories_created: usize,
    pub questions_created: usize,
    pub trophies_created: usize,
}

impl SeedReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.categories_created + self.questions_created + self.trophies_created
    }
}

type Text = (&'static str, &'static str);

struct CategorySeed {
    kind: CategoryKind,
    description: Text,
    icon_class: &'static str,
    order: u32,
}

struct QuestionSeed {
    category: CategoryKind,
    difficulty: Difficulty,
    text: Text,
    code_snippet: &'static str,
    answer: &'static str,
    hint: Text,
    explanation: Text,
}

struct TrophySeed {
    code: &'static str,
    requirement: RequirementType,
    name: Text,
    description: Text,
}

fn localized((en, zh): Text) -> LocalizedText {
    LocalizedText::new(en, zh)
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

const CATEGORIES: &[CategorySeed] = &[
    CategorySeed {
        kind: CategoryKind::Html,
        description: ("HTML markup and semantic web", "HTML 標記語言與語意網路"),
        icon_class: "fa-brands fa-html5",
        order: 1,
    },
    CategorySeed {
        kind: CategoryKind::Python,
        description: ("Python programming language", "Python 程式語言"),
        icon_class: "fa-brands fa-python",
        order: 2,
    },
    CategorySeed {
        kind: CategoryKind::Django,
        description: ("Django web framework", "Django 網頁框架"),
        icon_class: "fa-solid fa-d",
        order: 3,
    },
    CategorySeed {
        kind: CategoryKind::JavaScript,
        description: ("JavaScript programming", "JavaScript 程式設計"),
        icon_class: "fa-brands fa-js",
        order: 4,
    },
    CategorySeed {
        kind: CategoryKind::Css,
        description: ("Cascading Style Sheets", "層疊樣式表"),
        icon_class: "fa-brands fa-css3-alt",
        order: 5,
    },
    CategorySeed {
        kind: CategoryKind::Random,
        description: ("Mixed programming topics", "混合程式主題"),
        icon_class: "fa-solid fa-shuffle",
        order: 6,
    },
];

const QUESTIONS: &[QuestionSeed] = &[
    QuestionSeed {
        category: CategoryKind::Html,
        difficulty: Difficulty::Beginner,
        text: ("What HTML tag is used for paragraphs?", "哪個 HTML 標籤用於段落？"),
        code_snippet: "<p>This is a paragraph</p>",
        answer: "p",
        hint: ("Short for \"paragraph\"", "「段落」的縮寫"),
        explanation: (
            "The <p> tag defines a paragraph in HTML",
            "<p> 標籤在 HTML 中定義段落",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Html,
        difficulty: Difficulty::Beginner,
        text: ("What tag creates a hyperlink?", "哪個標籤創建超連結？"),
        code_snippet: "<a href=\"https://example.com\">Link</a>",
        answer: "a",
        hint: ("Short for \"anchor\"", "「錨點」的縮寫"),
        explanation: (
            "The <a> tag creates hyperlinks in HTML",
            "<a> 標籤在 HTML 中創建超連結",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Html,
        difficulty: Difficulty::Intermediate,
        text: (
            "What attribute specifies input type for forms?",
            "哪個屬性指定表單輸入類型？",
        ),
        code_snippet: "<input type=\"text\" />",
        answer: "type",
        hint: ("Defines the kind of input field", "定義輸入欄位的種類"),
        explanation: (
            "The type attribute specifies input field types like text, email, password",
            "type 屬性指定輸入欄位類型，如 text、email、password",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Html,
        difficulty: Difficulty::Advanced,
        text: (
            "What attribute makes content editable in browsers?",
            "哪個屬性使內容在瀏覽器中可編輯？",
        ),
        code_snippet: "<div contenteditable=\"true\">Edit me</div>",
        answer: "contenteditable",
        hint: ("Allows direct editing of element content", "允許直接編輯元素內容"),
        explanation: (
            "contenteditable makes any HTML element editable by the user",
            "contenteditable 使任何 HTML 元素可由使用者編輯",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Python,
        difficulty: Difficulty::Beginner,
        text: ("What keyword defines a function?", "哪個關鍵字定義函數？"),
        code_snippet: "def greet():\n    print(\"Hello\")",
        answer: "def",
        hint: ("Short for \"define\"", "「定義」的縮寫"),
        explanation: (
            "The def keyword is used to define functions in Python",
            "def 關鍵字用於在 Python 中定義函數",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Python,
        difficulty: Difficulty::Beginner,
        text: ("What function prints output to console?", "哪個函數將輸出列印到控制台？"),
        code_snippet: "print(\"Hello World\")",
        answer: "print",
        hint: ("Used to display text", "用於顯示文本"),
        explanation: ("print() outputs data to the console", "print() 將數據輸出到控制台"),
    },
    QuestionSeed {
        category: CategoryKind::Python,
        difficulty: Difficulty::Intermediate,
        text: ("What method adds an item to a list?", "哪個方法將項目添加到列表？"),
        code_snippet: "my_list = [1, 2, 3]\nmy_list.append(4)",
        answer: "append",
        hint: ("Adds to the end of the list", "添加到列表末尾"),
        explanation: (
            "append() adds an element to the end of a list",
            "append() 將元素添加到列表末尾",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Python,
        difficulty: Difficulty::Advanced,
        text: ("What keyword creates a generator function?", "哪個關鍵字創建生成器函數？"),
        code_snippet: "def counter():\n    n = 0\n    while True:\n        yield n\n        n += 1",
        answer: "yield",
        hint: ("Produces values one at a time", "一次產生一個值"),
        explanation: (
            "yield makes a function return a generator that produces values lazily",
            "yield 使函數返回惰性產生值的生成器",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Django,
        difficulty: Difficulty::Beginner,
        text: ("What class do Django models inherit from?", "Django 模型繼承自哪個類？"),
        code_snippet: "class Post(models.Model):\n    title = models.CharField(max_length=200)",
        answer: "Model",
        hint: ("Base class in models module", "models 模組中的基類"),
        explanation: (
            "All Django models inherit from models.Model",
            "所有 Django 模型都繼承自 models.Model",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Django,
        difficulty: Difficulty::Beginner,
        text: ("What command starts the development server?", "哪個命令啟動開發伺服器？"),
        code_snippet: "python manage.py runserver",
        answer: "runserver",
        hint: ("Runs the local server", "運行本地伺服器"),
        explanation: (
            "runserver starts Django's development web server",
            "runserver 啟動 Django 的開發網頁伺服器",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Django,
        difficulty: Difficulty::Intermediate,
        text: (
            "What method retrieves all objects from database?",
            "哪個方法從資料庫檢索所有物件？",
        ),
        code_snippet: "posts = Post.objects.all()",
        answer: "all",
        hint: ("Returns every record", "返回每條記錄"),
        explanation: (
            "all() returns a QuerySet containing all objects",
            "all() 返回包含所有物件的 QuerySet",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Django,
        difficulty: Difficulty::Advanced,
        text: (
            "What method prefetches related objects to reduce queries?",
            "哪個方法預先獲取相關物件以減少查詢？",
        ),
        code_snippet: "posts = Post.objects.prefetch_related(\"comments\")",
        answer: "prefetch_related",
        hint: ("Optimizes related object fetching", "優化相關物件的獲取"),
        explanation: (
            "prefetch_related() reduces database queries for related objects",
            "prefetch_related() 減少相關物件的資料庫查詢",
        ),
    },
    QuestionSeed {
        category: CategoryKind::JavaScript,
        difficulty: Difficulty::Beginner,
        text: ("What keyword declares a constant variable?", "哪個關鍵字聲明常量變數？"),
        code_snippet: "const PI = 3.14159;",
        answer: "const",
        hint: ("Cannot be reassigned", "不能重新賦值"),
        explanation: (
            "const declares a constant that cannot be reassigned",
            "const 聲明一個不能重新賦值的常量",
        ),
    },
    QuestionSeed {
        category: CategoryKind::JavaScript,
        difficulty: Difficulty::Beginner,
        text: ("What function displays an alert dialog?", "哪個函數顯示警告對話框？"),
        code_snippet: "alert(\"Hello!\");",
        answer: "alert",
        hint: ("Shows a popup message", "顯示彈出訊息"),
        explanation: (
            "alert() displays a dialog with a message",
            "alert() 顯示帶有訊息的對話框",
        ),
    },
    QuestionSeed {
        category: CategoryKind::JavaScript,
        difficulty: Difficulty::Intermediate,
        text: (
            "What method adds an element to the end of an array?",
            "哪個方法將元素添加到陣列末尾？",
        ),
        code_snippet: "arr.push(5);",
        answer: "push",
        hint: ("Pushes to the end", "推送到末尾"),
        explanation: (
            "push() adds elements to the end of an array",
            "push() 將元素添加到陣列末尾",
        ),
    },
    QuestionSeed {
        category: CategoryKind::JavaScript,
        difficulty: Difficulty::Advanced,
        text: ("What keyword waits for a promise to resolve?", "哪個關鍵字等待 promise 解析？"),
        code_snippet: "const data = await fetch(url);",
        answer: "await",
        hint: ("Pauses execution until resolved", "暫停執行直到解析"),
        explanation: (
            "await pauses async function execution until promise resolves",
            "await 暫停非同步函數執行直到 promise 解析",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Css,
        difficulty: Difficulty::Beginner,
        text: ("What property sets text color?", "哪個屬性設定文字顏色？"),
        code_snippet: ".text { color: blue; }",
        answer: "color",
        hint: ("Controls text color", "控制文字顏色"),
        explanation: ("The color property sets the color of text", "color 屬性設定文字的顏色"),
    },
    QuestionSeed {
        category: CategoryKind::Css,
        difficulty: Difficulty::Beginner,
        text: ("What property controls font size?", "哪個屬性控制字體大小？"),
        code_snippet: "p { font-size: 16px; }",
        answer: "font-size",
        hint: ("Sets the size of text", "設定文字大小"),
        explanation: ("font-size controls the size of text", "font-size 控制文字大小"),
    },
    QuestionSeed {
        category: CategoryKind::Css,
        difficulty: Difficulty::Intermediate,
        text: ("What display value creates a flex container?", "哪個 display 值創建 flex 容器？"),
        code_snippet: ".container { display: flex; }",
        answer: "flex",
        hint: ("Enables flexbox layout", "啟用 flexbox 布局"),
        explanation: (
            "display: flex creates a flex container for flexible layouts",
            "display: flex 創建用於靈活布局的 flex 容器",
        ),
    },
    QuestionSeed {
        category: CategoryKind::Css,
        difficulty: Difficulty::Advanced,
        text: ("What property creates a grid layout?", "哪個屬性創建網格布局？"),
        code_snippet: ".grid { display: grid; }",
        answer: "grid",
        hint: ("Two-dimensional layout system", "二維布局系統"),
        explanation: (
            "display: grid creates a two-dimensional grid layout",
            "display: grid 創建二維網格布局",
        ),
    },
];

const TROPHIES: &[TrophySeed] = &[
    TrophySeed {
        code: "LEVEL_5",
        requirement: RequirementType::Level,
        name: ("Beginner Graduate", "新手畢業生"),
        description: ("Reach player level 5", "達到玩家等級 5"),
    },
    TrophySeed {
        code: "LEVEL_10",
        requirement: RequirementType::Level,
        name: ("Rising Star", "新星崛起"),
        description: ("Reach player level 10", "達到玩家等級 10"),
    },
    TrophySeed {
        code: "LEVEL_25",
        requirement: RequirementType::Level,
        name: ("Expert Coder", "專家程式員"),
        description: ("Reach player level 25", "達到玩家等級 25"),
    },
    TrophySeed {
        code: "LEVEL_50",
        requirement: RequirementType::Level,
        name: ("Master Developer", "大師開發者"),
        description: ("Reach player level 50", "達到玩家等級 50"),
    },
    TrophySeed {
        code: "LEVEL_100",
        requirement: RequirementType::Level,
        name: ("Coding Legend", "編碼傳奇"),
        description: ("Reach player level 100", "達到玩家等級 100"),
    },
    TrophySeed {
        code: "HTML_MASTER",
        requirement: RequirementType::CategoryMaster,
        name: ("HTML Master", "HTML 大師"),
        description: ("Complete 50 HTML questions correctly", "正確完成 50 道 HTML 題目"),
    },
    TrophySeed {
        code: "PYTHON_MASTER",
        requirement: RequirementType::CategoryMaster,
        name: ("Python Master", "Python 大師"),
        description: ("Complete 50 Python questions correctly", "正確完成 50 道 Python 題目"),
    },
    TrophySeed {
        code: "DJANGO_MASTER",
        requirement: RequirementType::CategoryMaster,
        name: ("Django Master", "Django 大師"),
        description: ("Complete 50 Django questions correctly", "正確完成 50 道 Django 題目"),
    },
    TrophySeed {
        code: "JS_MASTER",
        requirement: RequirementType::CategoryMaster,
        name: ("JavaScript Master", "JavaScript 大師"),
        description: (
            "Complete 50 JavaScript questions correctly",
            "正確完成 50 道 JavaScript 題目",
        ),
    },
    TrophySeed {
        code: "CSS_MASTER",
        requirement: RequirementType::CategoryMaster,
        name: ("CSS Master", "CSS 大師"),
        description: ("Complete 50 CSS questions correctly", "正確完成 50 道 CSS 題目"),
    },
    TrophySeed {
        code: "FIRST_WIN",
        requirement: RequirementType::Level,
        name: ("First Victory", "首次勝利"),
        description: ("Win your first game", "贏得你的第一場遊戲"),
    },
    TrophySeed {
        code: "PERFECT_GAME",
        requirement: RequirementType::Level,
        name: ("Perfect Game", "完美遊戲"),
        description: ("Answer correctly on the first attempt", "第一次嘗試就答對"),
    },
    TrophySeed {
        code: "SPEED_DEMON",
        requirement: RequirementType::Level,
        name: ("Speed Demon", "速度惡魔"),
        description: ("Complete a game in under 30 seconds", "在 30 秒內完成遊戲"),
    },
    TrophySeed {
        code: "POLYGLOT",
        requirement: RequirementType::CategoryMaster,
        name: ("Polyglot Programmer", "多語言程式員"),
        description: ("Master all programming categories", "精通所有程式語言分類"),
    },
    TrophySeed {
        code: "NIGHT_OWL",
        requirement: RequirementType::Level,
        name: ("Night Owl", "夜貓子"),
        description: (
            "Play 10 games between midnight and 6 AM",
            "在午夜至早上 6 點之間遊玩 10 場遊戲",
        ),
    },
];

//
// ─── LOADER ────────────────────────────────────────────────────────────────────
//

/// Number of questions in the built-in catalog.
#[must_use]
pub fn question_count() -> usize {
    QUESTIONS.len()
}

/// Create any missing categories.
///
/// # Errors
///
/// Returns `SeedError` if a category is invalid or cannot be stored.
pub async fn seed_categories(storage: &Storage) -> Result<usize, SeedError> {
    let mut created = 0;
    for seed in CATEGORIES {
        let category = Category::new(
            CategoryId::new(0),
            seed.kind,
            localized(seed.description),
            seed.icon_class,
            seed.order,
        )?;
        let (id, was_created) = storage.catalog.ensure_category(&category).await?;
        if was_created {
            tracing::info!(category = seed.kind.code(), id = id.value(), "created category");
            created += 1;
        }
    }
    Ok(created)
}

/// Create any missing questions. Categories must already exist.
///
/// # Errors
///
/// Returns `SeedError` if a question is invalid or cannot be stored.
pub async fn seed_questions(storage: &Storage, now: DateTime<Utc>) -> Result<usize, SeedError> {
    let mut created = 0;
    for seed in QUESTIONS {
        let question = QuestionDraft {
            category: seed.category,
            difficulty: seed.difficulty,
            text: localized(seed.text),
            code_snippet: Some(seed.code_snippet.to_owned()),
            answer: seed.answer.to_owned(),
            hint: localized(seed.hint),
            explanation: localized(seed.explanation),
        }
        .validate(QuestionId::new(0), now)?;

        let (id, was_created) = storage.catalog.ensure_question(&question).await?;
        if was_created {
            tracing::info!(
                category = seed.category.code(),
                difficulty = seed.difficulty.code(),
                id = id.value(),
                "created question"
            );
            created += 1;
        }
    }
    Ok(created)
}

/// Create any missing trophies.
///
/// # Errors
///
/// Returns `SeedError` if a trophy is invalid or cannot be stored.
pub async fn seed_trophies(storage: &Storage) -> Result<usize, SeedError> {
    let mut created = 0;
    for seed in TROPHIES {
        let trophy = Trophy::new(
            seed.code,
            seed.requirement,
            localized(seed.name),
            localized(seed.description),
        )?;
        if storage.trophies.ensure_trophy(&trophy).await? {
            tracing::info!(code = seed.code, "created trophy");
            created += 1;
        }
    }
    Ok(created)
}

/// Load the whole catalog, optionally wiping it first.
///
/// # Errors
///
/// Returns `SeedError` if clearing or any insert fails.
pub async fn load_seed(
    storage: &Storage,
    now: DateTime<Utc>,
    clear: bool,
) -> Result<SeedReport, SeedError> {
    if clear {
        storage.catalog.clear_catalog().await?;
        tracing::info!("cleared catalog");
    }

    let report = SeedReport {
        categories_created: seed_categories(storage).await?,
        questions_created: seed_questions(storage, now).await?,
        trophies_created: seed_trophies(storage).await?,
    };
    tracing::info!(
        categories = report.categories_created,
        questions = report.questions_created,
        trophies = report.trophies_created,
        "seed data loaded"
    );
    Ok(report)
}
