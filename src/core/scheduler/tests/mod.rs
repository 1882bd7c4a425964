mod next_run;
