use crate::commands::CommandReport;
use crate::timeline::url_key::normalize;

pub fn run(urls: &[String]) -> CommandReport {
    let mut report = CommandReport::new("normalize");
    if urls.is_empty() {
        report.issue("no urls given");
        return report;
    }
    for url in urls {
        report.detail(format!("{url} => {}", normalize(url)));
    }
    report
}
