//! 本地備援流程使用的提示詞模板
//!
//! 每個函式只依賴輸入文字。輸出格式規則僅是給模型的指示，回應原樣傳回

use crate::domain::model::StructureMode;

pub fn describe_prompt(text: &str) -> String {
    format!(
        "You are an assistant that explains notes clearly.\n\
         \n\
         Based on the following extracted text, generate a clear natural-language\n\
         description explaining the topic and key ideas.\n\
         \n\
         Extracted text:\n\
         {}",
        text
    )
}

pub fn table_prompt(text: &str) -> String {
    format!(
        "You convert text into a table.\n\
         \n\
         Rules:\n\
         - Output ONLY a single JSON object, with no markdown fences and no commentary.\n\
         - The object has exactly two keys: \"columns\" and \"rows\".\n\
         - \"columns\" is an array of column names as strings.\n\
         - \"rows\" is an array of rows; each row is an array of strings.\n\
         - Every row has exactly as many cells as there are columns. Use \"\" for missing cells.\n\
         - Keep rows in the order they appear in the text.\n\
         \n\
         Example:\n\
         {{\"columns\": [\"Name\", \"Value\"], \"rows\": [[\"a\", \"1\"], [\"b\", \"2\"]]}}\n\
         \n\
         Text:\n\
         {}",
        text
    )
}

pub fn mindmap_prompt(text: &str) -> String {
    format!(
        "You convert text into a mind map written as a Markdown bullet list.\n\
         \n\
         Rules:\n\
         - Output ONLY the bullet list, with no headings and no commentary.\n\
         - There is exactly one root bullet naming the main topic.\n\
         - Every other bullet is nested under the root using two spaces per level.\n\
         - Use at most 4 levels of depth, counting the root as level 1.\n\
         - Keep each bullet short.\n\
         \n\
         Text:\n\
         {}",
        text
    )
}

pub fn auto_prompt(text: &str) -> String {
    format!(
        "You are an expert data structurer.\n\
         Analyze the text below.\n\
         - If it looks like a table, output a JSON object with \"columns\" and \"rows\", \
         where every row has as many cells as there are columns.\n\
         - If it looks like a process or hierarchy, output a Markdown bullet list \
         with a single root and at most 4 levels.\n\
         - Output ONLY the structured data.\n\
         \n\
         Text:\n\
         {}",
        text
    )
}

pub fn structure_prompt(mode: StructureMode, text: &str) -> String {
    match mode {
        StructureMode::Auto => auto_prompt(text),
        StructureMode::Table => table_prompt(text),
        StructureMode::Mindmap => mindmap_prompt(text),
    }
}
