//! The `examgen init` command.

use std::path::Path;

use anyhow::Result;

/// Write `content` to `path` unless the file already exists.
fn write_starter(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    println!("Created {}", path.display());
    Ok(())
}

pub fn execute() -> Result<()> {
    write_starter(Path::new("examgen.toml"), SAMPLE_SETTINGS)?;
    write_starter(Path::new("plan.txt"), SAMPLE_PLAN)?;
    write_starter(Path::new("data/bank.tsv"), SAMPLE_BANK)?;
    write_starter(Path::new("data/signups.tsv"), SAMPLE_SIGNUPS)?;

    println!("\nNext steps:");
    println!("  1. Put your questions in data/bank.tsv and signups in data/signups.tsv");
    println!("  2. Run: examgen validate --plan plan.txt");
    println!("  3. Run: examgen generate --plan plan.txt");

    Ok(())
}

const SAMPLE_SETTINGS: &str = r#"# examgen settings
data_dir = "./data"
output_dir = "./output"
history_dir = "./history"
history_prefix = "existingexams"
images_dir = "../images"
"#;

const SAMPLE_PLAN: &str = "\
# examgen exam plan
questions: bank.tsv
signups: signups.tsv
course: LING 200
exam type: midterm
student groups: 1001, 1002
random seed: wugz
generate up to: 2021-06-11
ordering: easy-medium-first
topics: Phonology; Morphology; WILD
difficulties: easy; hard; medium
wildcard topics: Syntax; Semantics
rubric: Score: ____ / 10
cutoff: previous-friday
layout: batch
";

const SAMPLE_SIGNUPS: &str = "\
Day\tTime\tSID
Thursday 2021-06-10\t10:00\t1001
Thursday 2021-06-10\t10:30\t1002
Thursday 2021-06-10\t11:00\t
Friday 2021-06-11\t9:00\t1003
";

const SAMPLE_BANK: &str = "\
UniqueID\tTopic\tDifficulty\tSource\tDateCompleted\tQuestionType\tInstructions\tData1\tInstructorComments
Q001\tPhonology\teasy\tPHON-00\t2021-01-15\tphonology-easy-0\tTranscribe the word.\t[data 1]\tSee answer key 1.
Q002\tPhonology\teasy\tPHON-01\t2021-01-15\tphonology-easy-1\tTranscribe the word.\t[data 2]\tSee answer key 2.
Q003\tPhonology\tmedium\tPHON-10\t2021-01-15\tphonology-medium-0\tIdentify the allophones.\t[data 3]\tSee answer key 3.
Q004\tPhonology\tmedium\tPHON-11\t2021-01-15\tphonology-medium-1\tIdentify the allophones.\t[data 4]\tSee answer key 4.
Q005\tPhonology\thard\tPHON-20\t2021-01-15\tphonology-hard-0\tState the rule.\t[data 5]\tSee answer key 5.
Q006\tPhonology\thard\tPHON-21\t2021-01-15\tphonology-hard-1\tState the rule.\t[data 6]\tSee answer key 6.
Q007\tMorphology\teasy\tMORP-00\t2021-01-15\tmorphology-easy-0\tSegment the word into morphemes.\t[data 7]\tSee answer key 7.
Q008\tMorphology\teasy\tMORP-01\t2021-01-15\tmorphology-easy-1\tSegment the word into morphemes.\t[data 8]\tSee answer key 8.
Q009\tMorphology\tmedium\tMORP-10\t2021-01-15\tmorphology-medium-0\tGloss the sentence.\t[data 9]\tSee answer key 9.
Q010\tMorphology\tmedium\tMORP-11\t2021-01-15\tmorphology-medium-1\tGloss the sentence.\t[data 10]\tSee answer key 10.
Q011\tMorphology\thard\tMORP-20\t2021-01-15\tmorphology-hard-0\tDescribe the paradigm.\t[data 11]\tSee answer key 11.
Q012\tMorphology\thard\tMORP-21\t2021-01-15\tmorphology-hard-1\tDescribe the paradigm.\t[data 12]\tSee answer key 12.
Q013\tSyntax\teasy\tSYNT-00\t2021-01-15\tsyntax-easy-0\tDraw the tree.\t[data 13]\tSee answer key 13.
Q014\tSyntax\teasy\tSYNT-01\t2021-01-15\tsyntax-easy-1\tDraw the tree.\t[data 14]\tSee answer key 14.
Q015\tSyntax\tmedium\tSYNT-10\t2021-01-15\tsyntax-medium-0\tIdentify the constituent.\t[data 15]\tSee answer key 15.
Q016\tSyntax\tmedium\tSYNT-11\t2021-01-15\tsyntax-medium-1\tIdentify the constituent.\t[data 16]\tSee answer key 16.
Q017\tSyntax\thard\tSYNT-20\t2021-01-15\tsyntax-hard-0\tFind the movement.\t[data 17]\tSee answer key 17.
Q018\tSyntax\thard\tSYNT-21\t2021-01-15\tsyntax-hard-1\tFind the movement.\t[data 18]\tSee answer key 18.
Q019\tSemantics\teasy\tSEMA-00\t2021-01-15\tsemantics-easy-0\tGive the entailments.\t[data 19]\tSee answer key 19.
Q020\tSemantics\teasy\tSEMA-01\t2021-01-15\tsemantics-easy-1\tGive the entailments.\t[data 20]\tSee answer key 20.
Q021\tSemantics\tmedium\tSEMA-10\t2021-01-15\tsemantics-medium-0\tTranslate into logic.\t[data 21]\tSee answer key 21.
Q022\tSemantics\tmedium\tSEMA-11\t2021-01-15\tsemantics-medium-1\tTranslate into logic.\t[data 22]\tSee answer key 22.
Q023\tSemantics\thard\tSEMA-20\t2021-01-15\tsemantics-hard-0\tFind the presupposition.\t[data 23]\tSee answer key 23.
Q024\tSemantics\thard\tSEMA-21\t2021-01-15\tsemantics-hard-1\tFind the presupposition.\t[data 24]\tSee answer key 24.
";
