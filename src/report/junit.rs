use super::types::TestResults;
use crate::runner::state::{ScenarioResult, ScenarioStatus};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

fn seconds(ms: u64) -> String {
    (ms as f64 / 1000.0).to_string()
}

/// Generate JUnit XML report string from TestResults
pub fn generate_junit_xml(results: &TestResults) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let summary = &results.summary;
    let total_duration: u64 = summary
        .total_duration_ms
        .unwrap_or_else(|| results.results.iter().map(|r| r.duration_ms).sum());

    // <testsuites>
    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "contract-checker-run"));
    suites_start.push_attribute(("tests", summary.total.to_string().as_str()));
    suites_start.push_attribute(("failures", summary.failed.to_string().as_str()));
    suites_start.push_attribute(("skipped", summary.skipped.to_string().as_str()));
    suites_start.push_attribute(("time", seconds(total_duration).as_str()));
    writer.write_event(Event::Start(suites_start))?;

    // One <testsuite> per checker session
    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", results.suite_name.as_str()));
    suite_start.push_attribute(("tests", summary.total.to_string().as_str()));
    suite_start.push_attribute(("failures", summary.failed.to_string().as_str()));
    suite_start.push_attribute(("skipped", summary.skipped.to_string().as_str()));
    suite_start.push_attribute(("id", results.session_id.as_str()));
    suite_start.push_attribute(("time", seconds(total_duration).as_str()));
    suite_start.push_attribute(("timestamp", results.generated_at.as_str()));
    suite_start.push_attribute(("hostname", results.endpoint.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for result in &results.results {
        write_test_case(&mut writer, &results.suite_name, result)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    suite_name: &str,
    result: &ScenarioResult,
) -> Result<()> {
    let mut case_start = BytesStart::new("testcase");
    let classname = suite_name.replace(['/', ' '], ".");

    case_start.push_attribute(("name", result.scenario_name.as_str()));
    case_start.push_attribute(("classname", classname.as_str()));
    case_start.push_attribute(("time", seconds(result.duration_ms).as_str()));
    writer.write_event(Event::Start(case_start))?;

    match &result.status {
        ScenarioStatus::Failed { error } => {
            let mut fail_start = BytesStart::new("failure");
            fail_start.push_attribute(("message", error.as_str()));
            let kind = if result.actual_status.is_some() || result.expected_status.is_none() {
                "AssertionError"
            } else {
                "TransportError"
            };
            fail_start.push_attribute(("type", kind));
            writer.write_event(Event::Start(fail_start))?;
            writer.write_event(Event::Text(BytesText::new(error)))?;
            writer.write_event(Event::End(BytesEnd::new("failure")))?;

            let out = format!(
                "expected status: {}\nactual status: {}\nbody: {}",
                result
                    .expected_status
                    .map_or_else(|| "-".to_string(), |s| s.to_string()),
                result
                    .actual_status
                    .map_or_else(|| "-".to_string(), |s| s.to_string()),
                result.actual_body.describe()
            );
            writer.write_event(Event::Start(BytesStart::new("system-out")))?;
            writer.write_event(Event::Text(BytesText::new(&out)))?;
            writer.write_event(Event::End(BytesEnd::new("system-out")))?;
        }
        ScenarioStatus::Skipped { reason } => {
            let mut skip = BytesStart::new("skipped");
            skip.push_attribute(("message", reason.as_str()));
            writer.write_event(Event::Empty(skip))?;
        }
        ScenarioStatus::Passed => {}
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Write report to file
pub fn write_report(results: &TestResults, output_dir: &Path) -> Result<()> {
    let xml = generate_junit_xml(results)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("    Generated JUnit report: {}", path.display());
    Ok(())
}
